mod manifest;
mod report;

use crate::manifest::{Manifest, ReleaseTarget};
use clap::Parser;
use graphics_kiln::{GraphicsResources, ResourcesConfig};
use nab_kiln::app::{AppRun, ExitReason};
use nab_kiln::TomlRead;
use std::path::PathBuf;

#[derive(Debug, Parser)]
struct CliArgs
{
    /// Resource settings (root directory, GPU budget). Defaults are used if omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// TOML list of resources to create, in order
    #[arg(long)]
    manifest: PathBuf,

    /// Release a resource after the manifest has been created, as <type>:<name>
    #[arg(long, value_name = "TYPE:NAME")]
    release: Vec<ReleaseTarget>,
}

fn main() -> ExitReason
{
    let app_run = AppRun::<CliArgs>::startup("Resource Inspector", env!("CARGO_PKG_VERSION"));

    let config = match &app_run.args.config
    {
        None => ResourcesConfig::default(),
        Some(path) => match ResourcesConfig::load_file(app_run.resolve_path(path))
        {
            Ok(config) => config,
            Err(err) =>
            {
                log::error!("Failed to load config '{}': {err}", path.display());
                app_run.set_exit_reason(ExitReason::BadConfig);
                return app_run.get_exit_reason();
            }
        },
    };

    let manifest_path = app_run.resolve_path(&app_run.args.manifest);
    let manifest = match Manifest::load_file(&manifest_path)
    {
        Ok(manifest) => manifest,
        Err(err) =>
        {
            log::error!("Failed to load manifest '{}': {err}", manifest_path.display());
            app_run.set_exit_reason(ExitReason::BadConfig);
            return app_run.get_exit_reason();
        }
    };

    let resources = GraphicsResources::new(config);
    let factory = resources.factory();

    let mut failures = 0;
    for entry in &manifest.resources
    {
        let created = entry.loader()
            .map_err(|err| err.to_string())
            .and_then(|loader| factory.create(&entry.type_tag, &entry.name, loader.as_ref()).map_err(|err| err.to_string()));
        match created
        {
            Ok(_) => log::info!("Created {} '{}'", entry.type_tag, entry.name),
            Err(err) =>
            {
                log::error!("Failed to create {} '{}': {err}", entry.type_tag, entry.name);
                failures += 1;
            }
        }
    }

    for target in &app_run.args.release
    {
        match factory.release(&target.type_tag, &target.name)
        {
            true => log::info!("Released {} '{}'", target.type_tag, target.name),
            false => log::warn!("Nothing to release for {} '{}'", target.type_tag, target.name),
        }
    }

    print!("{}", report::format_report(&resources.report()));
    println!("GPU memory: {:#.2}B / {:#.2}B",
        nab_kiln::format_binary!(resources.gpu_budget().used()),
        nab_kiln::format_binary!(resources.gpu_budget().capacity()));

    if failures > 0
    {
        log::error!("{failures} of {} resource(s) failed to create", manifest.resources.len());
        app_run.set_exit_reason(ExitReason::Failures);
    }
    app_run.get_exit_reason()
}
