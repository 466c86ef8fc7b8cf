use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use domain::entities::environment::ResolvedEnvironment;
use domain::entities::requirements::{ManifestBundle, RequirementsManifest};
use domain::manifest::{BindAddress, BuildDescriptor};
use domain::ports::copier::{CopyError, SourceCopier};
use domain::ports::installer::DependencyInstaller;
use domain::ports::launcher::{LaunchError, LaunchPlan, Launcher};
use domain::ports::package_manager::PackageManager;
use domain::ports::resolver::EnvironmentResolver;
use domain::system::store::{LayerKey, LayerMetadata, LayerStore};
use domain::{BuildError, BuildState, StageKind};

pub const PYTHONPATH_VAR: &str = "PYTHONPATH";
pub const PATH_VAR: &str = "PATH";
/// Where `pip install --target` puts console scripts, relative to the target.
pub const SCRIPTS_DIR: &str = "bin";
pub const CONTRACT_FILE: &str = ".berth/image.json";

/// Everything a build reads. Never mutated once the build starts.
#[derive(Debug, Clone)]
pub struct BuildInputs {
    pub descriptor: BuildDescriptor,
    pub source_dir: PathBuf,
    /// Effective working directory; the descriptor's unless overridden.
    pub workdir: PathBuf,
}

impl BuildInputs {
    pub fn new(descriptor: BuildDescriptor, source_dir: impl Into<PathBuf>) -> Self {
        let workdir = descriptor.workdir.clone();
        Self {
            descriptor,
            source_dir: source_dir.into(),
            workdir,
        }
    }

    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }
}

/// The ports a build drives.
pub struct Toolchain {
    pub resolver: Box<dyn EnvironmentResolver>,
    pub packages: Box<dyn PackageManager>,
    pub installer: Box<dyn DependencyInstaller>,
    pub copier: Box<dyn SourceCopier>,
    pub launcher: Box<dyn Launcher>,
}

impl Toolchain {
    pub fn new(
        resolver: impl EnvironmentResolver + 'static,
        packages: impl PackageManager + 'static,
        installer: impl DependencyInstaller + 'static,
        copier: impl SourceCopier + 'static,
        launcher: impl Launcher + 'static,
    ) -> Self {
        Self {
            resolver: Box::new(resolver),
            packages: Box::new(packages),
            installer: Box::new(installer),
            copier: Box::new(copier),
            launcher: Box::new(launcher),
        }
    }
}

/// The dependency layer a build ended up using.
#[derive(Debug, Clone, Serialize)]
pub struct LayerOutcome {
    pub key: LayerKey,
    pub site_packages: PathBuf,
    pub requirements: usize,
    pub cache_hit: bool,
}

/// What earlier stages hand to later ones.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildOutputs {
    pub environment: Option<ResolvedEnvironment>,
    pub runtime_env: Vec<(String, String)>,
    pub layer: Option<LayerOutcome>,
    pub files_copied: usize,
    pub exposed_port: Option<u16>,
    pub launch_plan: Option<LaunchPlan>,
}

pub struct BuildContext<'a> {
    pub inputs: &'a BuildInputs,
    pub tools: &'a Toolchain,
    pub store: &'a LayerStore,
    pub outputs: BuildOutputs,
}

impl<'a> BuildContext<'a> {
    pub fn new(inputs: &'a BuildInputs, tools: &'a Toolchain, store: &'a LayerStore) -> Self {
        Self {
            inputs,
            tools,
            store,
            outputs: BuildOutputs::default(),
        }
    }

    fn descriptor(&self) -> &'a BuildDescriptor {
        &self.inputs.descriptor
    }

    /// Requires `SelectBase` to have run.
    fn environment(&self, stage: StageKind) -> Result<&ResolvedEnvironment, BuildError> {
        self.outputs
            .environment
            .as_ref()
            .ok_or(BuildError::StageOrder {
                stage,
                expected: Some(StageKind::SelectBase),
                state: BuildState::Unconfigured,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    pub detail: String,
    /// Nothing had to be done; earlier work was reused.
    pub cached: bool,
}

impl StageOutcome {
    pub fn done(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            cached: false,
        }
    }

    pub fn cached(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            cached: true,
        }
    }
}

/// One step of the pipeline. Pre/postconditions come from its [`StageKind`].
pub trait Stage {
    fn kind(&self) -> StageKind;
    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<StageOutcome, BuildError>;
}

pub struct SelectBase;
pub struct ConfigureRuntime;
pub struct EstablishWorkdir;
pub struct InstallSystemPackages;
pub struct InstallManifest;
pub struct CopySource;
pub struct DeclarePort;
pub struct Launch;

/// All stages in [`StageKind::ORDER`].
pub fn standard_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(SelectBase),
        Box::new(ConfigureRuntime),
        Box::new(EstablishWorkdir),
        Box::new(InstallSystemPackages),
        Box::new(InstallManifest),
        Box::new(CopySource),
        Box::new(DeclarePort),
        Box::new(Launch),
    ]
}

impl Stage for SelectBase {
    fn kind(&self) -> StageKind {
        StageKind::SelectBase
    }

    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<StageOutcome, BuildError> {
        let base = &ctx.descriptor().base;
        let env = ctx
            .tools
            .resolver
            .resolve(base)
            .map_err(|source| BuildError::EnvironmentResolution {
                base: base.to_string(),
                source,
            })?;

        let detail = format!("{} ({} {})", base, env.interpreter.display(), env.version);
        ctx.outputs.environment = Some(env);
        Ok(StageOutcome::done(detail))
    }
}

impl Stage for ConfigureRuntime {
    fn kind(&self) -> StageKind {
        StageKind::ConfigureRuntime
    }

    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<StageOutcome, BuildError> {
        let vars: Vec<(String, String)> = ctx
            .descriptor()
            .runtime
            .env_vars()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let detail = if vars.is_empty() {
            "no flags enabled".to_string()
        } else {
            vars.iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(" ")
        };
        ctx.outputs.runtime_env = vars;
        Ok(StageOutcome::done(detail))
    }
}

impl Stage for EstablishWorkdir {
    fn kind(&self) -> StageKind {
        StageKind::EstablishWorkdir
    }

    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<StageOutcome, BuildError> {
        let workdir = &ctx.inputs.workdir;
        if workdir.is_dir() {
            return Ok(StageOutcome::cached(format!("{} exists", workdir.display())));
        }

        fs::create_dir_all(workdir).map_err(|source| BuildError::Workdir {
            path: workdir.clone(),
            source,
        })?;
        Ok(StageOutcome::done(format!("created {}", workdir.display())))
    }
}

impl Stage for InstallSystemPackages {
    fn kind(&self) -> StageKind {
        StageKind::InstallSystemPackages
    }

    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<StageOutcome, BuildError> {
        let wanted = &ctx.descriptor().system_packages;
        let pm = &ctx.tools.packages;

        let mut missing = Vec::new();
        for package in wanted {
            if !pm.is_installed(package)? {
                missing.push(package.clone());
            }
        }

        if missing.is_empty() {
            return Ok(StageOutcome::cached(format!(
                "{} package(s) already present",
                wanted.len()
            )));
        }

        tracing::info!(missing = ?missing, "installing system packages");
        pm.install_all(&missing)?;
        Ok(StageOutcome::done(format!("installed {}", missing.join(" "))))
    }
}

impl Stage for InstallManifest {
    fn kind(&self) -> StageKind {
        StageKind::InstallManifest
    }

    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<StageOutcome, BuildError> {
        let descriptor = ctx.descriptor();
        let bundle = ManifestBundle::load(&ctx.inputs.source_dir, &descriptor.manifest)?;
        let workdir_manifest = ctx.inputs.workdir.join(&descriptor.manifest);

        // Only the manifest and its includes go in before dependencies; the rest of the tree waits.
        for file in &bundle.files {
            ctx.tools.copier.copy_file(
                &ctx.inputs.source_dir.join(&file.path),
                &ctx.inputs.workdir.join(&file.path),
            )?;
        }
        let requirements = &bundle.manifest;

        let key = LayerKey::compute(
            &descriptor.base,
            &descriptor.system_packages,
            bundle.contents(),
        );
        let site_packages = ctx.store.site_packages(&key);

        if ctx.store.is_complete(&key) {
            tracing::info!(layer = %key.short(), "dependency layer cache hit");
            ctx.outputs.layer = Some(LayerOutcome {
                key: key.clone(),
                site_packages,
                requirements: requirements.len(),
                cache_hit: true,
            });
            return Ok(StageOutcome::cached(format!("layer {} reused", key.short())));
        }

        let env = ctx.environment(self.kind())?;
        ctx.store.prepare(&key)?;

        if let Err(err) = install_requirements(
            ctx.tools.installer.as_ref(),
            env,
            requirements,
            &workdir_manifest,
            &site_packages,
        ) {
            ctx.store.discard(&key)?;
            return Err(err);
        }

        ctx.store.commit(&LayerMetadata {
            key: key.clone(),
            base: descriptor.base.to_string(),
            requirements: requirements.len(),
            created_at: Utc::now(),
        })?;

        let detail = if requirements.is_blank() {
            "manifest lists no packages".to_string()
        } else {
            format!(
                "{} package(s) into layer {}",
                requirements.len(),
                key.short()
            )
        };
        ctx.outputs.layer = Some(LayerOutcome {
            key,
            site_packages,
            requirements: requirements.len(),
            cache_hit: false,
        });
        Ok(StageOutcome::done(detail))
    }
}

/// Resolves each requirement once, then installs the whole manifest.
fn install_requirements(
    installer: &dyn DependencyInstaller,
    env: &ResolvedEnvironment,
    requirements: &RequirementsManifest,
    manifest: &Path,
    target: &Path,
) -> Result<(), BuildError> {
    if requirements.is_blank() {
        return Ok(());
    }
    for requirement in &requirements.requirements {
        tracing::debug!(requirement = %requirement.raw, "resolving");
        installer.resolve(env, requirement)?;
    }
    installer.install(env, manifest, target)?;
    Ok(())
}

impl Stage for CopySource {
    fn kind(&self) -> StageKind {
        StageKind::CopySource
    }

    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<StageOutcome, BuildError> {
        let inputs = ctx.inputs;
        let copied = ctx.tools.copier.copy_tree(
            &inputs.source_dir,
            &inputs.workdir,
            &inputs.descriptor.ignore,
        )?;

        ctx.outputs.files_copied = copied;
        Ok(StageOutcome::done(format!(
            "{} file(s) into {}",
            copied,
            inputs.workdir.display()
        )))
    }
}

/// Written to the working directory for whatever orchestrates the process.
#[derive(Debug, Serialize)]
struct ImageContract<'a> {
    base: String,
    exposed_port: u16,
    bind: String,
    entrypoint: &'a [String],
    env: Vec<&'a str>,
    layer: Option<&'a str>,
}

impl Stage for DeclarePort {
    fn kind(&self) -> StageKind {
        StageKind::DeclarePort
    }

    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<StageOutcome, BuildError> {
        let descriptor = ctx.descriptor();
        let bind: BindAddress = descriptor.checked_bind()?;

        let contract = ImageContract {
            base: descriptor.base.to_string(),
            exposed_port: descriptor.expose,
            bind: bind.to_string(),
            entrypoint: &descriptor.entrypoint.0,
            env: ctx
                .outputs
                .runtime_env
                .iter()
                .map(|(k, _)| k.as_str())
                .collect(),
            layer: ctx.outputs.layer.as_ref().map(|l| l.key.as_str()),
        };

        let path = ctx.inputs.workdir.join(CONTRACT_FILE);
        let content = serde_json::to_vec_pretty(&contract).map_err(|e| {
            CopyError::new(&path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CopyError::new(parent, e))?;
        }
        fs::write(&path, content).map_err(|e| CopyError::new(&path, e))?;

        ctx.outputs.exposed_port = Some(descriptor.expose);
        Ok(StageOutcome::done(format!("{}/tcp", descriptor.expose)))
    }
}

impl Stage for Launch {
    fn kind(&self) -> StageKind {
        StageKind::Launch
    }

    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<StageOutcome, BuildError> {
        let plan = launch_plan(ctx)?;
        ctx.tools.launcher.launch(&plan)?;

        let detail = format!("{} {}", plan.program.display(), plan.args.join(" "));
        ctx.outputs.launch_plan = Some(plan);
        Ok(StageOutcome::done(detail))
    }
}

/// Builds the handoff: interpreter substitution, working directory and environment.
pub fn launch_plan(ctx: &BuildContext<'_>) -> Result<LaunchPlan, BuildError> {
    let descriptor = ctx.descriptor();
    let env = ctx.environment(StageKind::Launch)?;
    let program = descriptor
        .entrypoint
        .program()
        .ok_or(LaunchError::EmptyCommand)?;

    // `python manage.py ...` runs on the interpreter the base environment resolved to.
    let program = if program.starts_with(descriptor.base.runtime()) && !program.contains('/') {
        env.interpreter.clone()
    } else {
        PathBuf::from(program)
    };

    let mut vars = match &descriptor.env_file {
        Some(path) => load_env_file(&ctx.inputs.source_dir.join(path))?,
        None => Vec::new(),
    };
    vars.extend(ctx.outputs.runtime_env.iter().cloned());

    if let Some(layer) = &ctx.outputs.layer {
        let site = &layer.site_packages;
        for (key, dir) in [
            (PYTHONPATH_VAR, site.clone()),
            (PATH_VAR, site.join(SCRIPTS_DIR)),
        ] {
            prepend_search_path(&mut vars, key, &dir, std::env::var(key).ok());
        }
    }

    Ok(LaunchPlan {
        program,
        args: descriptor.entrypoint.args().to_vec(),
        workdir: ctx.inputs.workdir.clone(),
        env: vars,
    })
}

/// Puts `dir` in front of a `:`-separated variable, keeping the env file's value
/// or, failing that, the one this process inherited.
fn prepend_search_path(
    vars: &mut Vec<(String, String)>,
    key: &str,
    dir: &Path,
    inherited: Option<String>,
) {
    let existing = vars
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .or(inherited);
    let head = dir.display().to_string();
    let value = match existing {
        Some(rest) if !rest.is_empty() => format!("{}:{}", head, rest),
        _ => head,
    };
    vars.retain(|(k, _)| k != key);
    vars.push((key.to_string(), value));
}

fn load_env_file(path: &Path) -> Result<Vec<(String, String)>, LaunchError> {
    let to_err = |reason: String| LaunchError::EnvFile {
        path: path.to_path_buf(),
        reason,
    };

    let iter = dotenv::from_path_iter(path).map_err(|e| to_err(e.to_string()))?;
    iter.map(|item| item.map_err(|e| to_err(e.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_list_matches_order() {
        let kinds: Vec<StageKind> = standard_stages().iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, StageKind::ORDER.to_vec());
    }

    #[test]
    fn test_load_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "SECRET_KEY=abc\n# comment\nDB_PORT=3306\n").unwrap();

        let vars = load_env_file(&path).unwrap();
        assert_eq!(
            vars,
            vec![
                ("SECRET_KEY".to_string(), "abc".to_string()),
                ("DB_PORT".to_string(), "3306".to_string()),
            ]
        );
    }

    #[test]
    fn test_search_path_prefers_env_file_value() {
        let mut vars = vec![("PYTHONPATH".to_string(), "/opt/extra".to_string())];
        prepend_search_path(
            &mut vars,
            PYTHONPATH_VAR,
            Path::new("/layers/abc/site-packages"),
            Some("/from/shell".to_string()),
        );
        assert_eq!(
            vars,
            vec![(
                "PYTHONPATH".to_string(),
                "/layers/abc/site-packages:/opt/extra".to_string()
            )]
        );
    }

    #[test]
    fn test_search_path_keeps_inherited_value() {
        let mut vars = vec![("SECRET_KEY".to_string(), "abc".to_string())];
        prepend_search_path(
            &mut vars,
            PYTHONPATH_VAR,
            Path::new("/layers/abc/site-packages"),
            Some("/from/dotenv".to_string()),
        );
        prepend_search_path(&mut vars, PATH_VAR, Path::new("/layers/abc/site-packages/bin"), None);

        assert_eq!(
            vars[1],
            (
                "PYTHONPATH".to_string(),
                "/layers/abc/site-packages:/from/dotenv".to_string()
            )
        );
        assert_eq!(
            vars[2],
            ("PATH".to_string(), "/layers/abc/site-packages/bin".to_string())
        );
    }

    #[test]
    fn test_missing_env_file() {
        let err = load_env_file(Path::new("/nonexistent/.env")).unwrap_err();
        assert!(matches!(err, LaunchError::EnvFile { .. }));
    }
}
