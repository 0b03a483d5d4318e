use clap::Parser;
use nexc::grid::spec::{ExecutionSpace, GridSize, LookupError, PruningScheme, RadialQuad};
use std::path::PathBuf;
use std::str::FromStr;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "NExC reference driver - evaluates a neural exchange-correlation functional over a molecular grid.",
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    /// Input file in HDF5 format
    #[arg(value_name = "INPUT", value_parser = existing_file)]
    pub input: PathBuf,

    /// Functional checkpoint to evaluate
    #[arg(long, required = true, value_name = "PATH")]
    pub model: PathBuf,

    /// Expected SHA-256 digest of the checkpoint (overrides the built-in pins)
    #[arg(long, value_name = "HEX")]
    pub model_hash: Option<String>,

    /// Grid specification (fine|ultrafine|superfine|gm3|gm5), case-insensitive
    #[arg(long, default_value_t = GridSize::Fine, value_parser = spec::<GridSize>)]
    pub grid_size: GridSize,

    /// Radial quadrature (becke|muraknowles|treutlerahlrichs|murrayhandylaming), case-insensitive
    #[arg(long, default_value_t = RadialQuad::MuraKnowles, value_parser = spec::<RadialQuad>)]
    pub radial_quad: RadialQuad,

    /// Pruning scheme (unpruned|robust|treutler), case-insensitive
    #[arg(long, default_value_t = PruningScheme::Robust, value_parser = spec::<PruningScheme>)]
    pub prune_scheme: PruningScheme,

    /// Load balancing execution space (host|device), case-insensitive
    #[arg(long, default_value_t = ExecutionSpace::Host, value_parser = spec::<ExecutionSpace>)]
    pub lb_exec_space: ExecutionSpace,

    /// Integration execution space (host|device), case-insensitive
    #[arg(long, default_value_t = ExecutionSpace::Host, value_parser = spec::<ExecutionSpace>)]
    pub int_exec_space: ExecutionSpace,

    /// Grid points per integration batch
    #[arg(long, default_value_t = 512, value_name = "INT")]
    pub batch_size: usize,

    /// Screening tolerance applied to every basis shell
    #[arg(long, default_value_t = 1e-10, value_name = "FLOAT")]
    pub basis_tol: f64,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Case-normalizing lookup used for every enumeration option.
fn spec<T>(value: &str) -> Result<T, LookupError>
where
    T: FromStr<Err = LookupError>,
{
    value.parse()
}

fn existing_file(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("'{value}' is not an existing file"))
    }
}
