use clap::{arg, Arg, ArgAction, Command};

pub const ANALYZE_CMD: &str = "analyze";
pub const CLASSIFY_CMD: &str = "classify";
pub const DRUGS_CMD: &str = "drugs";
pub const STATUS_CMD: &str = "status";

fn rules_arg() -> Arg {
    arg!(--rules <FILE> "JSON phenotype rule table replacing the reference rules")
        .required(false)
}

fn backend_args() -> [Arg; 2] {
    [
        arg!(--backend <BACKEND> "Reasoning backend: gemini or ollama (env PHARMAGUARD_BACKEND)")
            .required(false),
        arg!(--model <MODEL> "Model name (env PHARMAGUARD_MODEL)").required(false),
    ]
}

pub fn create_analyze_cli() -> Command {
    Command::new(ANALYZE_CMD)
        .about("Analyze a variant file against one or more drugs and write a report per drug.")
        .arg(Arg::new("vcf").required(true).help("Annotated VCF file, plain or gzip"))
        .arg(
            Arg::new("drug")
                .long("drug")
                .short('d')
                .required(true)
                .action(ArgAction::Append)
                .value_delimiter(',')
                .help("Drug to analyze; repeat or comma-separate for several"),
        )
        .arg(arg!(--"patient-id" <ID> "Patient identifier (generated when omitted)").required(false))
        .arg(arg!(--out <DIR> "Report directory (env PHARMAGUARD_REPORTS_DIR)").required(false))
        .arg(arg!(--concurrent "Run all drug analyses at once"))
        .args(backend_args())
        .arg(rules_arg())
}

pub fn create_classify_cli() -> Command {
    Command::new(CLASSIFY_CMD)
        .about("Print the diplotype and phenotype for one gene without calling the reasoning service.")
        .arg(Arg::new("vcf").required(true).help("Annotated VCF file, plain or gzip"))
        .arg(arg!(--gene <GENE> "Gene to classify, e.g. CYP2D6").required(true))
        .arg(rules_arg())
}

pub fn create_drugs_cli() -> Command {
    Command::new(DRUGS_CMD).about("List supported drugs and their primary genes.")
}

pub fn create_status_cli() -> Command {
    Command::new(STATUS_CMD)
        .about("Check that the configured reasoning backend is reachable and has the model.")
        .args(backend_args())
}
