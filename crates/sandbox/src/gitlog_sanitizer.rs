#![forbid(unsafe_code)]

use crate::error::SandboxError;

const ALLOWED_FLAGS: &[&str] =
    &["--format", "--author", "--since", "--until", "--grep", "--no-merges", "-n"];
const DANGEROUS_CHARS: &[char] = &['|', ';', '&', '$', '`', '\\'];
const MAX_N: u32 = 50;

/// Validates the raw tokens a sandboxed `gitLog` call wants to pass, per §4.8's allow-list.
/// Returns the (possibly `-n`-capped) argument list ready to hand to the git subprocess, or the
/// specific rejection reason.
pub fn sanitize(args: &[String]) -> Result<Vec<String>, SandboxError> {
    let mut sanitized = Vec::with_capacity(args.len());
    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        if arg.chars().any(|c| DANGEROUS_CHARS.contains(&c)) {
            return Err(SandboxError::DangerousCharacter { arg: arg.clone() });
        }

        if arg == "-n" {
            i += 1;
            let value = args.get(i).ok_or_else(|| SandboxError::InvalidN { value: String::new() })?;
            let n: u32 = value.parse().map_err(|_| SandboxError::InvalidN { value: value.clone() })?;
            sanitized.push("-n".to_string());
            sanitized.push(n.min(MAX_N).to_string());
        } else if let Some(rest) = arg.strip_prefix("-n") {
            let n: u32 = rest.parse().map_err(|_| SandboxError::InvalidN { value: arg.clone() })?;
            sanitized.push(format!("-n{}", n.min(MAX_N)));
        } else if arg.starts_with("--") {
            let flag = arg.split_once('=').map(|(f, _)| f).unwrap_or(arg.as_str());
            if !ALLOWED_FLAGS.contains(&flag) {
                return Err(SandboxError::DisallowedFlag { flag: flag.to_string() });
            }
            sanitized.push(arg.clone());
        } else if let Some(letter) = arg.strip_prefix('-') {
            if !letter.is_empty() {
                return Err(SandboxError::DisallowedFlag { flag: arg.clone() });
            }
            sanitized.push(arg.clone());
        } else {
            sanitized.push(arg.clone());
        }
        i += 1;
    }
    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_dangerous_characters() {
        let err = sanitize(&["--grep=foo; rm -rf /".to_string()]).unwrap_err();
        assert_eq!(err.tag(), "dangerous-character");
    }

    #[test]
    fn rejects_unknown_flags() {
        let err = sanitize(&["--exec=evil".to_string()]).unwrap_err();
        assert_eq!(err.tag(), "disallowed-flag");
    }

    #[test]
    fn rejects_unknown_single_letter_flags() {
        let err = sanitize(&["-x".to_string()]).unwrap_err();
        assert_eq!(err.tag(), "disallowed-flag");
    }

    #[test]
    fn caps_n_at_fifty() {
        let sanitized = sanitize(&["-n".to_string(), "9999".to_string()]).unwrap();
        assert_eq!(sanitized, vec!["-n".to_string(), "50".to_string()]);
    }

    #[test]
    fn allows_known_flags_and_positional_args() {
        let sanitized = sanitize(&["--no-merges".to_string(), "--author=alice".to_string()]).unwrap();
        assert_eq!(sanitized, vec!["--no-merges".to_string(), "--author=alice".to_string()]);
    }
}
