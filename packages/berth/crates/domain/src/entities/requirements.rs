use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Leading characters that make the remainder of a line a version specifier
/// or an environment marker rather than garbage.
const SPECIFIER_STARTS: &[char] = &['=', '<', '>', '!', '~', ';', '@', '('];

#[derive(Error, Debug)]
pub enum RequirementsError {
    #[error("Failed to read dependency manifest {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid requirement on line {line}: '{content}'")]
    InvalidLine { line: usize, content: String },
    #[error("{} includes '{target}', which is outside the source tree", from.display())]
    IncludeOutsideSource { from: PathBuf, target: String },
}

/// One third-party package entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub name: String,
    pub extras: Vec<String>,
    /// Version specifier and/or marker, e.g. `>=4.2,<5` or `==1.0 ; python_version < "3.11"`.
    pub specifier: Option<String>,
    /// `name[extras]specifier` as written, without comments or per-line options.
    pub raw: String,
    /// Trailing per-requirement options such as `--hash=sha256:...`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub line: usize,
}

impl Requirement {
    /// Name compared case- and separator-insensitively (`Django_REST.framework` → `django-rest-framework`).
    pub fn normalized_name(&self) -> String {
        let mut out = String::with_capacity(self.name.len());
        let mut last_sep = false;
        for c in self.name.chars() {
            if matches!(c, '-' | '_' | '.') {
                if !last_sep {
                    out.push('-');
                }
                last_sep = true;
            } else {
                out.push(c.to_ascii_lowercase());
                last_sep = false;
            }
        }
        out
    }

    fn parse(line: usize, full: &str) -> Result<Self, RequirementsError> {
        let invalid = || RequirementsError::InvalidLine {
            line,
            content: full.to_string(),
        };
        let (text, options) = split_line_options(full);

        let name_len = text
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
            .unwrap_or(text.len());
        let name = &text[..name_len];

        let starts_ok = name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
        let ends_ok = name.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
        if !starts_ok || !ends_ok {
            return Err(invalid());
        }

        let mut rest = text[name_len..].trim_start();
        let mut extras = Vec::new();
        if let Some(after_bracket) = rest.strip_prefix('[') {
            let close = after_bracket.find(']').ok_or_else(invalid)?;
            extras = after_bracket[..close]
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect();
            rest = after_bracket[close + 1..].trim_start();
        }

        let specifier = if rest.is_empty() {
            None
        } else if rest.starts_with(SPECIFIER_STARTS) {
            Some(rest.trim_end().to_string())
        } else {
            return Err(invalid());
        };

        Ok(Self {
            name: name.to_string(),
            extras,
            specifier,
            raw: text.to_string(),
            options,
            line,
        })
    }
}

/// Parsed dependency manifest: requirements plus installer option lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementsManifest {
    pub requirements: Vec<Requirement>,
    /// Lines starting with `-` (`--index-url ...`, `-r other.txt`), kept verbatim.
    pub options: Vec<String>,
}

impl RequirementsManifest {
    pub fn load(path: &Path) -> Result<Self, RequirementsError> {
        let content = fs::read_to_string(path).map_err(|source| RequirementsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, RequirementsError> {
        let mut manifest = Self::default();

        for (line, text) in logical_lines(content) {
            let text = strip_comment(&text).trim();
            if text.is_empty() {
                continue;
            }
            if text.starts_with('-') {
                manifest.options.push(text.to_string());
                continue;
            }
            manifest.requirements.push(Requirement::parse(line, text)?);
        }

        Ok(manifest)
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// No requirements and no options: the installer has nothing to do.
    pub fn is_blank(&self) -> bool {
        self.requirements.is_empty() && self.options.is_empty()
    }

    /// Local files named by `-r`/`--requirement` and `-c`/`--constraint` lines.
    /// Remote (`https://...`) targets are left to the installer.
    pub fn includes(&self) -> Vec<Include> {
        self.options
            .iter()
            .filter_map(|option| Include::parse(option))
            .filter(|include| !include.target.contains("://"))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeKind {
    Requirements,
    Constraints,
}

/// One `-r`/`-c` option line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    pub kind: IncludeKind,
    pub target: String,
}

impl Include {
    fn parse(option: &str) -> Option<Self> {
        const FLAGS: [(&str, IncludeKind); 4] = [
            ("--requirement", IncludeKind::Requirements),
            ("--constraint", IncludeKind::Constraints),
            ("-r", IncludeKind::Requirements),
            ("-c", IncludeKind::Constraints),
        ];

        FLAGS.iter().find_map(|(flag, kind)| {
            let rest = option.strip_prefix(flag)?;
            let rest = match rest.strip_prefix('=') {
                Some(value) => value,
                // `--requirementx` is a different flag; `-rbase.txt` is fine.
                None if flag.starts_with("--") && !rest.starts_with(char::is_whitespace) => {
                    return None
                }
                None => rest,
            };
            let target = rest.trim();
            (!target.is_empty()).then(|| Self {
                kind: *kind,
                target: target.to_string(),
            })
        })
    }
}

/// One manifest file read from the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFile {
    /// Relative to the source tree.
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// The dependency manifest plus every local file it includes, recursively.
///
/// `manifest` merges the requirements of the top file and its `-r` includes;
/// constraint files only contribute their bytes.
#[derive(Debug, Clone, Default)]
pub struct ManifestBundle {
    /// Top-level manifest first, then includes in the order they were reached.
    pub files: Vec<ManifestFile>,
    pub manifest: RequirementsManifest,
}

impl ManifestBundle {
    pub fn load(source_dir: &Path, manifest: &Path) -> Result<Self, RequirementsError> {
        let mut bundle = Self::default();
        let mut seen = HashSet::new();
        bundle.visit(
            source_dir,
            manifest.to_path_buf(),
            IncludeKind::Requirements,
            &mut seen,
        )?;
        Ok(bundle)
    }

    /// Byte contents of every file, in `files` order.
    pub fn contents(&self) -> impl Iterator<Item = &[u8]> {
        self.files.iter().map(|f| f.bytes.as_slice())
    }

    fn visit(
        &mut self,
        source_dir: &Path,
        relative: PathBuf,
        kind: IncludeKind,
        seen: &mut HashSet<PathBuf>,
    ) -> Result<(), RequirementsError> {
        if !seen.insert(relative.clone()) {
            return Ok(());
        }

        let path = source_dir.join(&relative);
        let bytes = fs::read(&path).map_err(|source| RequirementsError::Io { path, source })?;
        let parsed = RequirementsManifest::parse(&String::from_utf8_lossy(&bytes))?;
        let includes = parsed.includes();

        self.files.push(ManifestFile {
            path: relative.clone(),
            bytes,
        });
        if kind == IncludeKind::Requirements {
            self.manifest.requirements.extend(parsed.requirements);
        }
        self.manifest.options.extend(parsed.options);

        let parent = relative.parent().unwrap_or(Path::new(""));
        for include in includes {
            let target = normalize(&parent.join(&include.target)).ok_or_else(|| {
                RequirementsError::IncludeOutsideSource {
                    from: relative.clone(),
                    target: include.target.clone(),
                }
            })?;
            // Everything reached through a constraints file is a constraint.
            let kind = match kind {
                IncludeKind::Constraints => IncludeKind::Constraints,
                IncludeKind::Requirements => include.kind,
            };
            self.visit(source_dir, target, kind, seen)?;
        }
        Ok(())
    }
}

/// Lexically resolves `.` and `..`; `None` if the path is absolute or climbs out.
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}

/// Splits `pkg==1.0 --hash=sha256:a --hash=sha256:b` into the requirement and its options.
fn split_line_options(text: &str) -> (&str, Vec<String>) {
    let mut prev_ws = false;
    for (i, c) in text.char_indices() {
        if prev_ws && text[i..].starts_with("--") {
            let mut options: Vec<String> = Vec::new();
            for token in text[i..].split_whitespace() {
                match options.last_mut() {
                    Some(last) if !token.starts_with("--") => {
                        last.push(' ');
                        last.push_str(token);
                    }
                    _ => options.push(token.to_string()),
                }
            }
            return (text[..i].trim_end(), options);
        }
        prev_ws = c.is_whitespace();
    }
    (text, Vec::new())
}

/// Joins backslash continuations; each item carries its first physical line number.
fn logical_lines(content: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, physical) in content.lines().enumerate() {
        let (start, mut buf) = pending.take().unwrap_or((idx + 1, String::new()));
        match physical.strip_suffix('\\') {
            Some(head) => {
                buf.push_str(head);
                pending = Some((start, buf));
            }
            None => {
                buf.push_str(physical);
                lines.push((start, buf));
            }
        }
    }
    if let Some(rest) = pending {
        lines.push(rest);
    }
    lines
}

/// A `#` starts a comment at line start or after whitespace; `url#egg=` is kept.
fn strip_comment(line: &str) -> &str {
    let mut prev_ws = true;
    for (i, c) in line.char_indices() {
        if c == '#' && prev_ws {
            return &line[..i];
        }
        prev_ws = c.is_whitespace();
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typical_manifest() {
        let content = r#"
# web
Django>=5.0,<5.1
djangorestframework==3.15.2   # api
mysqlclient
django-environ ; python_version >= "3.8"
"#;
        let manifest = RequirementsManifest::parse(content).unwrap();
        assert_eq!(manifest.len(), 4);
        assert_eq!(manifest.requirements[0].name, "Django");
        assert_eq!(manifest.requirements[0].specifier.as_deref(), Some(">=5.0,<5.1"));
        assert_eq!(manifest.requirements[1].raw, "djangorestframework==3.15.2");
        assert_eq!(manifest.requirements[2].specifier, None);
        assert_eq!(manifest.requirements[3].line, 6);
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = RequirementsManifest::parse("\n# nothing here\n\n").unwrap();
        assert!(manifest.is_empty());
        assert!(manifest.options.is_empty());
    }

    #[test]
    fn test_extras_and_options() {
        let content = "--index-url https://pypi.org/simple\nuvicorn[standard, watch]>=0.30\n";
        let manifest = RequirementsManifest::parse(content).unwrap();
        assert_eq!(manifest.options, vec!["--index-url https://pypi.org/simple"]);
        assert_eq!(manifest.requirements[0].extras, vec!["standard", "watch"]);
        assert_eq!(manifest.requirements[0].specifier.as_deref(), Some(">=0.30"));
    }

    #[test]
    fn test_line_continuation() {
        let content = "requests\\\n  >=2.31\nscrapy\n";
        let manifest = RequirementsManifest::parse(content).unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.requirements[0].specifier.as_deref(), Some(">=2.31"));
        assert_eq!(manifest.requirements[1].line, 3);
    }

    #[test]
    fn test_invalid_line_reports_number() {
        let err = RequirementsManifest::parse("django\n??broken\n").unwrap_err();
        match err {
            RequirementsError::InvalidLine { line, content } => {
                assert_eq!(line, 2);
                assert_eq!(content, "??broken");
            }
            other => panic!("Expected InvalidLine, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_operator_rejected() {
        assert!(RequirementsManifest::parse("django 5.0\n").is_err());
    }

    #[test]
    fn test_hashed_requirement_options_split_off() {
        let content = "django==5.0 \\\n    --hash=sha256:aaaa \\\n    --hash=sha256:bbbb\nasgiref==3.8.1 --hash sha256:cccc\n";
        let manifest = RequirementsManifest::parse(content).unwrap();

        let django = &manifest.requirements[0];
        assert_eq!(django.raw, "django==5.0");
        assert_eq!(django.specifier.as_deref(), Some("==5.0"));
        assert_eq!(django.options, vec!["--hash=sha256:aaaa", "--hash=sha256:bbbb"]);

        let asgiref = &manifest.requirements[1];
        assert_eq!(asgiref.raw, "asgiref==3.8.1");
        assert_eq!(asgiref.options, vec!["--hash sha256:cccc"]);
        assert_eq!(asgiref.line, 4);
    }

    #[test]
    fn test_includes() {
        let content = "-r base.txt\n--requirement=dev/extra.txt\n-cconstraints.txt\n--index-url https://pypi.org/simple\n-r https://example.com/reqs.txt\n";
        let manifest = RequirementsManifest::parse(content).unwrap();
        assert!(manifest.is_empty());
        assert!(!manifest.is_blank());

        let includes = manifest.includes();
        assert_eq!(
            includes,
            vec![
                Include { kind: IncludeKind::Requirements, target: "base.txt".into() },
                Include { kind: IncludeKind::Requirements, target: "dev/extra.txt".into() },
                Include { kind: IncludeKind::Constraints, target: "constraints.txt".into() },
            ]
        );
    }

    #[test]
    fn test_bundle_follows_includes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("reqs")).unwrap();
        fs::write(root.join("requirements.txt"), "-r reqs/base.txt\ngunicorn\n").unwrap();
        fs::write(root.join("reqs/base.txt"), "django\n-c pins.txt\n-r ../requirements.txt\n").unwrap();
        fs::write(root.join("reqs/pins.txt"), "django==5.0\n").unwrap();

        let bundle = ManifestBundle::load(root, Path::new("requirements.txt")).unwrap();

        let paths: Vec<&Path> = bundle.files.iter().map(|f| f.path.as_path()).collect();
        assert_eq!(
            paths,
            vec![
                Path::new("requirements.txt"),
                Path::new("reqs/base.txt"),
                Path::new("reqs/pins.txt"),
            ]
        );
        // Constraint pins are not requirements of their own.
        let names: Vec<&str> = bundle.manifest.requirements.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["gunicorn", "django"]);
        assert_eq!(bundle.contents().count(), 3);
    }

    #[test]
    fn test_bundle_rejects_include_outside_source() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("requirements.txt"), "-r ../../etc/reqs.txt\n").unwrap();

        let err = ManifestBundle::load(dir.path(), Path::new("requirements.txt")).unwrap_err();
        assert!(matches!(err, RequirementsError::IncludeOutsideSource { .. }));
    }

    #[test]
    fn test_bundle_missing_include() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("requirements.txt"), "-r base.txt\n").unwrap();

        let err = ManifestBundle::load(dir.path(), Path::new("requirements.txt")).unwrap_err();
        assert!(matches!(err, RequirementsError::Io { .. }));
    }

    #[test]
    fn test_normalized_name() {
        let manifest = RequirementsManifest::parse("Django_REST..framework\n").unwrap();
        assert_eq!(
            manifest.requirements[0].normalized_name(),
            "django-rest-framework"
        );
    }
}
