use std::fmt::Debug;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicI32, Ordering};

// Workspace crates that log at the app's verbosity rather than the global default
const WORKSPACE_CRATES: &[&str] =
&[
    "nab_kiln",
    "debug_kiln",
    "resource_kiln",
    "graphics_kiln",
];

pub trait CliArgs: clap::Parser + Debug { }
impl<T: clap::Parser + Debug> CliArgs for T { }

fn crate_name<T>() -> &'static str
{
    let name = std::any::type_name::<T>();
    match name.find("::")
    {
        Some(i) => &name[0..i],
        None => name,
    }
}

#[derive(Debug)]
pub struct AppRun<TCliArgs: CliArgs>
{
    pub app_name: &'static str,
    pub version_str: &'static str,

    pub start_time: chrono::DateTime<chrono::Local>,
    pub args: TCliArgs,
    pub pid: u32,
    pub is_elevated: bool,

    pub working_dir: PathBuf,

    exit_reason: AtomicI32,
}
impl<TCliArgs: CliArgs> AppRun<TCliArgs>
{
    pub fn startup(app_name: &'static str, app_version: &'static str) -> Self
    {
        #[cfg(debug_assertions)]
        let default_log_levels = (log::LevelFilter::Warn, log::LevelFilter::Debug);
        #[cfg(not(debug_assertions))]
        let default_log_levels = (log::LevelFilter::Warn, log::LevelFilter::Info);
        let app_crate = crate_name::<TCliArgs>();

        let mut log_builder = colog::basic_builder();
        log_builder
            .filter_level(default_log_levels.0)
            .filter_module(app_crate, default_log_levels.1);
        for workspace_crate in WORKSPACE_CRATES
        {
            log_builder.filter_module(workspace_crate, default_log_levels.1);
        }
        log_builder.parse_default_env().init();

        let app_run = Self
        {
            app_name,
            version_str: app_version,
            start_time: chrono::Local::now(),
            args: TCliArgs::parse(),
            pid: std::process::id(),
            is_elevated: is_root::is_root(),
            working_dir: std::env::current_dir().unwrap_or_default(),
            exit_reason: AtomicI32::new(ExitReason::NormalExit as i32),
        };

        log::info!(target: app_crate,
            "=== Starting {} v{} [{}] (PID {}){} at {} ===",
            app_run.app_name,
            app_run.version_str,
            std::env::args().collect::<Vec<_>>().join(" "),
            app_run.pid,
            if app_run.is_elevated { " elevated" } else { "" },
            app_run.start_time);

        app_run
    }

    pub fn set_exit_reason(&self, exit_reason: ExitReason)
    {
        self.exit_reason.store(exit_reason as i32, Ordering::SeqCst);
    }
    pub fn get_exit_reason(&self) -> ExitReason
    {
        ExitReason::from_i32(self.exit_reason.load(Ordering::SeqCst))
    }

    // Resolve a path relative to the directory the app was started from
    pub fn resolve_path(&self, path: impl Into<PathBuf>) -> PathBuf
    {
        let path = path.into();
        match path.is_absolute()
        {
            true => path,
            false => self.working_dir.join(path),
        }
    }
}
impl<TCliArgs: CliArgs> Drop for AppRun<TCliArgs>
{
    fn drop(&mut self)
    {
        log::info!(target: "app",
            "Exiting {} (PID {}) at {} with reason {:?}",
            self.app_name,
            self.pid,
            chrono::Local::now(),
            self.get_exit_reason());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitReason
{
    NormalExit = 0,
    Failures = 1, // the app ran to completion but reported errors
    BadConfig = 2,
}
impl ExitReason
{
    fn from_i32(value: i32) -> Self
    {
        match value
        {
            0 => Self::NormalExit,
            1 => Self::Failures,
            _ => Self::BadConfig,
        }
    }
}
impl std::process::Termination for ExitReason
{
    fn report(self) -> ExitCode
    {
        (self as u8).into()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn exit_reason_round_trips()
    {
        for reason in [ExitReason::NormalExit, ExitReason::Failures, ExitReason::BadConfig]
        {
            assert_eq!(reason, ExitReason::from_i32(reason as i32));
        }
    }

    #[test]
    fn crate_names()
    {
        assert_eq!("nab_kiln", crate_name::<ExitReason>());
        assert_eq!("u32", crate_name::<u32>());
    }
}
