/// Command line options and the validated runtime configuration
///
/// `Cli` is the raw clap parser; `Config` is what the rest of the program
/// works with. The render options also travel in the viewer URL
/// (`?flip&linear&shading=sky`) so the viewer window can be pointed at any
/// running server.
use clap::{Parser, ValueEnum};
use std::io::{IsTerminal, Read};
use std::net::SocketAddr;
use tracing::debug;
use url::Url;

use crate::catalog::local::CatalogSource;
use crate::render::color::ColorEncoding;
use crate::rig::shading::Shading;
use crate::server::cors::CorsPolicy;

#[derive(Parser, Debug)]
#[command(name = "model-browser", version)]
#[command(about = "Browse a directory of GLB models as thumbnails with a live 3D preview")]
pub struct Cli {
    /// A directory containing models, or a list of .glb files. Files can also be piped in.
    pub files: Vec<String>,

    /// Port to serve on (default: any free port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// View models from the other side (camera at z < 0)
    #[arg(short, long)]
    pub flip: bool,

    /// Write linear color instead of sRGB-encoded color
    #[arg(short, long)]
    pub linear: bool,

    /// List files recursively when [FILES] is a directory
    #[arg(short, long)]
    pub recursive: bool,

    /// Only run the server; do not open the viewer window
    #[arg(long)]
    pub no_open: bool,

    /// Comma-separated origins allowed to fetch model files, or '*'
    #[arg(short = 'c', long)]
    pub allow_cors: Option<String>,

    /// Stop after this many minutes without a heartbeat (0 disables)
    #[arg(short, long, default_value_t = 15)]
    pub timeout_minutes: u64,

    /// Lighting and material treatment of rendered models
    #[arg(short, long, value_enum, default_value_t = Shading::Flat)]
    pub shading: Shading,
}

/// How models are rendered, shared by thumbnails and the preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewOptions {
    pub flip: bool,
    pub encoding: ColorEncoding,
    pub shading: Shading,
}

impl ViewOptions {
    /// Viewer URL for a server bound at `addr`
    pub fn viewer_url(&self, addr: SocketAddr) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!("http://{}/", addr))?;

        let mut params = Vec::new();
        if self.flip {
            params.push("flip".to_string());
        }
        if self.encoding == ColorEncoding::Linear {
            params.push("linear".to_string());
        }
        if self.shading != Shading::Flat {
            if let Some(value) = self.shading.to_possible_value() {
                params.push(format!("shading={}", value.get_name()));
            }
        }

        if !params.is_empty() {
            url.set_query(Some(&params.join("&")));
        }
        Ok(url)
    }

    /// Read the options back from a viewer URL; unknown values fall back to defaults
    pub fn from_url(url: &Url) -> Self {
        let mut options = ViewOptions::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "flip" => options.flip = true,
                "linear" => options.encoding = ColorEncoding::Linear,
                "shading" => {
                    options.shading = Shading::from_str(&value, true).unwrap_or_default();
                }
                _ => {}
            }
        }
        options
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub source: CatalogSource,
    pub port: Option<u16>,
    pub view: ViewOptions,
    pub open: bool,
    pub cors: CorsPolicy,
    pub timeout_minutes: u64,
}

impl Config {
    pub fn from_cli(cli: Cli, stdin: Option<&str>) -> Self {
        Self {
            source: CatalogSource::from_inputs(stdin, &cli.files, cli.recursive),
            port: cli.port,
            view: ViewOptions {
                flip: cli.flip,
                encoding: if cli.linear {
                    ColorEncoding::Linear
                } else {
                    ColorEncoding::Srgb
                },
                shading: cli.shading,
            },
            open: !cli.no_open,
            cors: CorsPolicy::parse(cli.allow_cors.as_deref()),
            timeout_minutes: cli.timeout_minutes,
        }
    }
}

/// Piped standard input, if any
pub fn read_stdin() -> Option<String> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return None;
    }

    let mut text = String::new();
    match stdin.read_to_string(&mut text) {
        Ok(_) => Some(text),
        Err(e) => {
            debug!("No usable stdin: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(args: &[&str]) -> Config {
        let cli = Cli::try_parse_from(std::iter::once("model-browser").chain(args.iter().copied()))
            .expect("valid arguments");
        Config::from_cli(cli, None)
    }

    #[test]
    fn test_defaults() {
        let config = config(&["models"]);
        assert_eq!(
            config.source,
            CatalogSource::Directory {
                path: PathBuf::from("models"),
                recursive: false
            }
        );
        assert_eq!(config.port, None);
        assert_eq!(config.view, ViewOptions::default());
        assert_eq!(config.view.shading, Shading::Flat);
        assert_eq!(config.view.shading, Shading::default());
        assert!(config.open);
        assert_eq!(config.cors, CorsPolicy::Disabled);
        assert_eq!(config.timeout_minutes, 15);
    }

    #[test]
    fn test_short_flags() {
        let config = config(&[
            "-p", "8080", "-f", "-l", "-r", "-c", "*", "-t", "0", "-s", "sky", "--no-open", "dir",
        ]);
        assert_eq!(config.port, Some(8080));
        assert!(config.view.flip);
        assert_eq!(config.view.encoding, ColorEncoding::Linear);
        assert_eq!(config.view.shading, Shading::Sky);
        assert!(!config.open);
        assert_eq!(config.cors, CorsPolicy::AnyOrigin);
        assert_eq!(config.timeout_minutes, 0);
        assert!(matches!(config.source, CatalogSource::Directory { recursive: true, .. }));
    }

    #[test]
    fn test_file_arguments_select_list_mode() {
        let config = config(&["a.glb", "b.glb"]);
        assert_eq!(
            config.source,
            CatalogSource::List(vec!["a.glb".to_string(), "b.glb".to_string()])
        );
    }

    #[test]
    fn test_view_options_round_trip_through_url() {
        let addr: SocketAddr = "127.0.0.1:4000".parse().expect("addr");

        let plain = ViewOptions::default().viewer_url(addr).expect("url");
        assert_eq!(plain.as_str(), "http://127.0.0.1:4000/");
        assert_eq!(ViewOptions::from_url(&plain), ViewOptions::default());

        let options = ViewOptions {
            flip: true,
            encoding: ColorEncoding::Linear,
            shading: Shading::Environment,
        };
        let url = options.viewer_url(addr).expect("url");
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:4000/?flip&linear&shading=environment"
        );
        assert_eq!(ViewOptions::from_url(&url), options);
    }
}
