use everipc_wire::layout::{
    fixed_size, FieldLayout, ITEM2_FIELDS, LIST2_FIELDS, QUERY2_FIELDS,
};
use everipc_wire::{RequestFlags, ALL_RESULTS};
use serde::Serialize;

use crate::cmd::LayoutArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct FieldOutput {
    name: &'static str,
    offset: usize,
    size: usize,
}

#[derive(Serialize)]
struct StructOutput {
    name: &'static str,
    size: usize,
    fields: Vec<FieldOutput>,
}

#[derive(Serialize)]
struct FlagOutput {
    name: &'static str,
    value: String,
}

#[derive(Serialize)]
struct LayoutOutput {
    structures: Vec<StructOutput>,
    request_flags: Vec<FlagOutput>,
    all_results: String,
}

pub fn run(_args: LayoutArgs, format: OutputFormat) -> CliResult<i32> {
    let out = LayoutOutput {
        structures: vec![
            describe("QUERY2", QUERY2_FIELDS),
            describe("LIST2", LIST2_FIELDS),
            describe("ITEM2", ITEM2_FIELDS),
        ],
        request_flags: RequestFlags::all()
            .iter_names()
            .map(|(name, flag)| FlagOutput {
                name,
                value: format!("0x{:08X}", flag.bits()),
            })
            .collect(),
        all_results: format!("0x{ALL_RESULTS:08X}"),
    };

    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let rows = out
                .structures
                .iter()
                .flat_map(|s| {
                    s.fields.iter().map(move |f| {
                        vec![
                            s.name.to_string(),
                            f.name.to_string(),
                            f.offset.to_string(),
                            size_label(f.size),
                        ]
                    })
                })
                .collect();
            print_table(&["STRUCT", "FIELD", "OFFSET", "SIZE"], rows);

            let rows = out
                .request_flags
                .iter()
                .map(|f| vec![f.name.to_string(), f.value.clone()])
                .collect();
            print_table(&["REQUEST FLAG", "VALUE"], rows);
        }
        OutputFormat::Pretty | OutputFormat::Raw => print_pretty(&out),
    }
    Ok(SUCCESS)
}

fn describe(name: &'static str, fields: &[FieldLayout]) -> StructOutput {
    StructOutput {
        name,
        size: fixed_size(fields),
        fields: fields
            .iter()
            .map(|f| FieldOutput {
                name: f.name,
                offset: f.offset,
                size: f.size,
            })
            .collect(),
    }
}

fn size_label(size: usize) -> String {
    if size == 0 {
        "variable".to_string()
    } else {
        size.to_string()
    }
}

fn print_pretty(out: &LayoutOutput) {
    println!("Structure sizes:");
    for s in &out.structures {
        println!("  {}: {} bytes", s.name, s.size);
    }
    for s in &out.structures {
        println!();
        println!("Field offsets in {}:", s.name);
        for f in &s.fields {
            println!("  {}: {}", f.name, f.offset);
        }
    }
    println!();
    println!("Request flag values:");
    for f in &out.request_flags {
        println!("  {}: {}", f.name, f.value);
    }
    println!();
    println!("ALL_RESULTS: {}", out.all_results);
}
