// Command line front end for the KYC verification flows.

use clap::{Parser, Subcommand};
use ekyc::models::{AadhaarClaim, DeclaredIdentity, DocumentRequest, DocumentType, KycRequest, PanClaim};
use ekyc::utils::logging;
use ekyc::{load_settings, KycError, KycVerifier};
use log::debug;
use serde::Serialize;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file applied on top of ./ekyc.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Face match percent needed for a VERIFIED combined verdict
    #[arg(long, global = true)]
    face_threshold: Option<u8>,
    /// Cut-off shown on the ID data match line
    #[arg(long, global = true)]
    text_threshold: Option<u8>,
    /// Fuzzy score needed on the Aadhaar and PAN field checks
    #[arg(long, global = true)]
    fuzzy_threshold: Option<u8>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Combined check of an ID card and a selfie against declared data
    Verify {
        #[arg(long)]
        id_card: Option<PathBuf>,
        #[arg(long)]
        face_photo: Option<PathBuf>,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        id_type: String,
        #[arg(long, default_value = "")]
        id_number: String,
    },
    /// Field by field check of an Aadhaar card
    Aadhaar {
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long)]
        face: Option<PathBuf>,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "", help = "Date of birth as printed, e.g. 15/08/1990")]
        dob: String,
        #[arg(long, default_value = "")]
        gender: String,
        #[arg(long, default_value = "")]
        number: String,
    },
    /// Field by field check of a PAN card
    Pan {
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long)]
        face: Option<PathBuf>,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        dob: String,
        #[arg(long, default_value = "")]
        father_name: String,
        #[arg(long, default_value = "")]
        number: String,
    },
    /// Print the identity fields found on a card
    Extract {
        #[arg(long, conflicts_with = "text")]
        image: Option<PathBuf>,
        #[arg(long, help = "Already delimited OCR text, e.g. \"|NAME|RAHUL KUMAR|\"")]
        text: Option<String>,
        #[arg(long, help = "PAN or AADHAR; both extractors compete when omitted")]
        document_type: Option<DocumentType>,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(if e.is_client_error() { 2 } else { 1 });
    }
}

fn run(cli: Cli) -> Result<(), KycError> {
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(face) = cli.face_threshold {
        settings.thresholds.face_match_percent = face;
    }
    if let Some(text) = cli.text_threshold {
        settings.thresholds.text_match_percent = text;
    }
    if let Some(fuzzy) = cli.fuzzy_threshold {
        settings.thresholds.fuzzy_score = fuzzy;
    }
    settings.validate()?;

    // Text-only extraction needs no collaborators at all
    if let Commands::Extract {
        image: None,
        text: Some(text),
        document_type,
    } = &cli.command
    {
        return print_json(&KycVerifier::extract_from_text(text.clone(), *document_type));
    }

    let verifier = KycVerifier::from_settings(settings)?;
    debug!("Settings: {:?}", verifier.settings());

    match cli.command {
        Commands::Verify {
            id_card,
            face_photo,
            name,
            id_type,
            id_number,
        } => {
            let request = KycRequest {
                id_card,
                face_photo,
                declared: DeclaredIdentity {
                    name,
                    id_type,
                    id_number,
                },
            };
            print_json(&verifier.verify(&request)?)
        }
        Commands::Aadhaar {
            image,
            face,
            name,
            dob,
            gender,
            number,
        } => {
            let request = DocumentRequest {
                document_image: image,
                face_image: face,
                claim: AadhaarClaim {
                    name,
                    dob,
                    gender,
                    aadhaar_number: number,
                },
            };
            print_json(&verifier.verify_aadhaar(&request)?)
        }
        Commands::Pan {
            image,
            face,
            name,
            dob,
            father_name,
            number,
        } => {
            let request = DocumentRequest {
                document_image: image,
                face_image: face,
                claim: PanClaim {
                    name,
                    dob,
                    father_name,
                    pan_number: number,
                },
            };
            print_json(&verifier.verify_pan(&request)?)
        }
        Commands::Extract {
            image, document_type, ..
        } => print_json(&verifier.extract(image.as_deref(), document_type)?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), KycError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
