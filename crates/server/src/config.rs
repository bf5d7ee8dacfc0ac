//! Command-line and environment configuration

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Server settings; every flag can also come from the environment
#[derive(Debug, Clone, Parser)]
#[command(name = "resume-server", version, about = "Render resumes and CVs to PDF over HTTP")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "RESUME_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Directory searched for the embeddable CJK font
    #[arg(long, env = "RESUME_FONT_DIR", default_value = "public/fonts")]
    pub font_dir: PathBuf,

    /// Directory holding `resume/resume.html` and `cv/cv.html`
    #[arg(long, env = "RESUME_TEMPLATE_DIR", default_value = "public/docs")]
    pub template_dir: PathBuf,

    /// Render with builtin Helvetica when no CJK font is installed
    #[arg(long, env = "RESUME_ALLOW_FONT_FALLBACK")]
    pub allow_font_fallback: bool,

    /// Headless browser used for the HTML template path
    #[arg(long, env = "RESUME_CHROMIUM")]
    pub chromium: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flags_override_defaults() {
        let config = Config::try_parse_from([
            "resume-server",
            "--bind",
            "0.0.0.0:8080",
            "--font-dir",
            "/srv/fonts",
            "--allow-font-fallback",
            "--chromium",
            "/usr/bin/chromium",
        ])
        .unwrap();

        assert_eq!(config.bind, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.font_dir, PathBuf::from("/srv/fonts"));
        assert!(config.allow_font_fallback);
        assert_eq!(config.chromium, Some(PathBuf::from("/usr/bin/chromium")));
    }

    #[test]
    fn test_rejects_bad_bind_address() {
        assert!(Config::try_parse_from(["resume-server", "--bind", "nowhere"]).is_err());
    }
}
