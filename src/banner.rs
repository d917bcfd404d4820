//! Startup banner and shutdown message.

use std::net::SocketAddr;
use std::time::Duration;

use crate::config::RelayConfig;
use crate::consts::{VERSION, format_bytes};

/// What the banner shows about the running relay.
pub struct BannerInfo<'a> {
    pub listen: SocketAddr,
    pub extractor: &'a str,
    pub solver: &'a str,
    pub timeout: Duration,
    pub max_output: usize,
}

impl<'a> BannerInfo<'a> {
    pub fn from_config(config: &RelayConfig, extractor: &'a str, solver: &'a str) -> Self {
        Self {
            listen: config.listen,
            extractor,
            solver,
            timeout: config.extractor.timeout.max(config.solver.timeout),
            max_output: config.extractor.max_output_bytes.max(config.solver.max_output_bytes),
        }
    }
}

/// Render the startup banner.
pub fn render_banner(info: &BannerInfo) -> String {
    format!(
        r#"
   ╔═══════════════════════════════════════╗
   ║        S U D O K U   R E L A Y        ║
   ╚═══════════════════════════════════════╝

   version    {}
   listen     http://{}
   extractor  {}
   solver     {}
   timeout    {}s
   max output {}
"#,
        VERSION,
        info.listen,
        info.extractor,
        info.solver,
        info.timeout.as_secs(),
        format_bytes(info.max_output),
    )
}

pub fn print_banner(info: &BannerInfo) {
    println!("{}", render_banner(info));
}

pub fn print_goodbye() {
    println!("goodbye.");
}
