use crate::command::{Context, SetupCommand};
use crate::error::{ESResult, SetupError};
use crate::platform::host_architecture;
use crate::toolcache::{DirectoryToolcache, Toolcache, ToolcacheError};
use crate::tui::jdk_color;
use clap::Args;
use error_stack::ResultExt;
use owo_colors::{OwoColorize, Stream};

/// List the JDKs in the toolcache.
#[derive(Debug, Args)]
pub struct ListCached {
    /// Only list this architecture. Defaults to the host architecture.
    #[clap(long)]
    architecture: Option<String>,
}

/// Every `Java_*` tool in the cache with its complete versions for `arch`, sorted by tool name.
fn cached_jdks(
    toolcache: &DirectoryToolcache,
    arch: &str,
) -> ESResult<Vec<(String, Vec<String>)>, ToolcacheError> {
    let root = toolcache.root();
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut tools = Vec::new();
    for entry in root
        .read_dir()
        .change_context(ToolcacheError::Read)
        .attach_with(|| format!("Could not list {}", root.display()))?
    {
        let entry = entry.change_context(ToolcacheError::Read)?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !name.starts_with("Java_") {
            continue;
        }
        let versions = toolcache.find_all_versions(&name, arch)?;
        if !versions.is_empty() {
            tools.push((name, versions));
        }
    }
    tools.sort();
    Ok(tools)
}

impl SetupCommand for ListCached {
    fn run(self, context: Context) -> ESResult<(), SetupError> {
        let toolcache = DirectoryToolcache::locate(context.config.toolcache_dir.as_deref());
        let arch = self
            .architecture
            .as_deref()
            .unwrap_or(host_architecture());
        let tools = cached_jdks(&toolcache, arch)
            .change_context(SetupError::Unexpected)
            .attach("Failed to read the toolcache")?;

        eprintln!("Cached JDKs in {} ({}):", toolcache.root().display(), arch);
        for (tool, versions) in tools {
            println!("- {}", tool);
            for version in versions {
                println!(
                    "  - {}",
                    version.if_supports_color(Stream::Stdout, |s| s.color(jdk_color()))
                );
            }
        }
        Ok(())
    }
}
