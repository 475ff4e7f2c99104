use clap::Parser;
use miette::Result;
use partpick::cli::helpers::log_filter;
use partpick::cli::{Cli, Commands};
use partpick::core::Config;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    // A broken config file is reported by the command itself
    let verbose = global.verbose || Config::load().map(|c| c.verbose()).unwrap_or(false);
    init_logging(verbose);

    match cli.command {
        Commands::Run(args) => partpick::cli::commands::run::run(args, &global),
        Commands::Sheets(args) => partpick::cli::commands::sheets::run(args, &global),
        Commands::Groups(args) => partpick::cli::commands::groups::run(args, &global),
        Commands::Lookup(args) => partpick::cli::commands::lookup::run(args, &global),
        Commands::Config(cmd) => partpick::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => partpick::cli::commands::completions::run(args),
    }
}

/// Log to stderr
fn init_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
