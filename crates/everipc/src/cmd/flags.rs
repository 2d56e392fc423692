use everipc_wire::RequestFlags;
use serde::Serialize;

use crate::cmd::FlagsArgs;
use crate::exit::{wire_error, CliResult, SUCCESS};
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct FlagsOutput {
    value: String,
    decimal: u32,
    names: Vec<&'static str>,
    unknown: Option<String>,
    diagnostic: Option<String>,
}

pub fn run(args: FlagsArgs, format: OutputFormat) -> CliResult<i32> {
    let flags =
        RequestFlags::parse(&args.expr).map_err(|err| wire_error("invalid flags", err))?;
    let check = RequestFlags::validate(flags.bits());

    let out = FlagsOutput {
        value: format!("0x{:08X}", flags.bits()),
        decimal: flags.bits(),
        names: check.known.iter_names().map(|(name, _)| name).collect(),
        unknown: (!check.is_clean()).then(|| format!("0x{:08X}", check.unknown)),
        diagnostic: check.diagnostic(),
    };

    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let mut rows: Vec<Vec<String>> = check
                .known
                .iter_names()
                .map(|(name, flag)| vec![name.to_string(), format!("0x{:08X}", flag.bits())])
                .collect();
            if let Some(unknown) = &out.unknown {
                rows.push(vec!["(unknown)".to_string(), unknown.clone()]);
            }
            rows.push(vec!["TOTAL".to_string(), out.value.clone()]);
            print_table(&["FLAG", "VALUE"], rows);
        }
        OutputFormat::Pretty => {
            println!("{} = {}", out.value, out.names.join(" | "));
            if let Some(note) = &out.diagnostic {
                println!("note: {note}");
            }
        }
        OutputFormat::Raw => println!("{}", out.value),
    }
    Ok(SUCCESS)
}
