use blazetrace::{BrowserOptions, CheckoutScript, Runner};
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "blazetrace")]
#[command(about = "Scripted demoblaze checkout flow with performance trace capture")]
#[command(version)]
struct Cli {
    /// Run the browser in headless mode
    #[arg(long)]
    headless: bool,

    /// Where to write the login-phase trace
    #[arg(long, value_name = "PATH")]
    trace_login: Option<PathBuf>,

    /// Where to write the checkout-phase trace
    #[arg(long, value_name = "PATH")]
    trace_checkout: Option<PathBuf>,

    /// Per-wait timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Verbose output (-v for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate the script without launching a browser
    #[arg(long)]
    check: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> blazetrace::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let mut script = CheckoutScript::demoblaze();
    if let Some(path) = cli.trace_login {
        script.trace_login = path;
    }
    if let Some(path) = cli.trace_checkout {
        script.trace_checkout = path;
    }
    if let Some(ms) = cli.timeout_ms {
        script.timeout_ms = ms;
    }
    script.validate()?;

    if cli.check {
        println!("Script valid: {}", script.url);
        println!("  Item: {}", script.item_text);
        println!("  Selectors: {}", script.selectors.iter().count());
        println!(
            "  Traces: {} / {}",
            script.trace_login.display(),
            script.trace_checkout.display()
        );
        println!("  Timeout: {}ms", script.timeout_ms);
        return Ok(());
    }

    let options = BrowserOptions {
        headless: cli.headless,
        ..Default::default()
    };

    println!("Running checkout flow against {}", script.url);

    let runner = Runner::launch(&options).await?;
    let result = runner.run(&script).await;

    // Print result
    println!();
    if result.success {
        println!("✓ Success");
    } else {
        println!("✗ Failed");
        if let Some(ref error) = result.error {
            println!("  Error: {}", error);
        }
    }
    for trace in &result.traces {
        println!("  Trace: {}", trace.display());
    }
    println!("  Duration: {}ms", result.duration_ms);

    if !result.success {
        std::process::exit(1);
    }

    Ok(())
}
