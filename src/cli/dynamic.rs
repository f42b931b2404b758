// ============================================================
// Layer 1 — Dynamic Train Arguments
// ============================================================
// The flags `train` accepts depend on which modules are picked,
// so they cannot be derived statically. Parsing runs in two
// passes:
//
//   pass 1: peek --data_module / --model_module / --graph_module
//           in the raw tokens and resolve them in the registries
//   pass 2: build a clap Command from the harness, trainer and
//           resolved modules' ArgSpec schemas, then parse for real
//
// With --tolerate_unknown_args, unrecognised flags (and their
// value) are dropped before pass 2 instead of failing it.

use clap::{builder::BoolishValueParser, value_parser, Arg, ArgAction, ArgMatches, Command};
use std::collections::BTreeSet;

use crate::application::registry::{Registries, RegistryEntry};
use crate::application::train_use_case::{
    main_schema, trainer_schema, DATA_MODULE_FLAG, GRAPH_MODULE_FLAG, MODEL_MODULE_FLAG,
};
use crate::domain::args::{parse_boolish, parse_finite, ArgKind, ArgSpec, ParsedArgs};
use crate::domain::error::{BodaError, Result};
use crate::domain::hparams::HValue;

const TOLERATE_FLAG: &str = "tolerate_unknown_args";

/// A schema section and the module that declared it
type Section = (&'static str, Vec<ArgSpec>);

/// Parse raw `train` tokens (without the program and subcommand names)
pub fn parse_train_args(raw: &[String], registries: &Registries) -> Result<ParsedArgs> {
    let schema = collect_schema(resolve_sections(raw, registries)?);

    let tokens = if tolerate_unknown(raw) {
        let known: BTreeSet<&str> = schema.iter().map(|(_, s)| s.name).collect();
        let (kept, dropped) = drop_unknown(raw, &known);
        if !dropped.is_empty() {
            eprintln!("Ignoring unrecognised arguments: {}", dropped.join(" "));
            tracing::warn!("Ignoring unrecognised arguments: {:?}", dropped);
        }
        kept
    } else {
        raw.to_vec()
    };

    let matches = build_command(&schema)
        .try_get_matches_from(std::iter::once("train".to_string()).chain(tokens))?;
    Ok(to_parsed(&matches, &schema))
}

/// Harness and trainer flags plus every module that was named
fn resolve_sections(raw: &[String], registries: &Registries) -> Result<Vec<Section>> {
    let mut sections = vec![("Harness", main_schema()), ("Trainer", trainer_schema())];

    if let Some(Some(name)) = peek_flag(raw, DATA_MODULE_FLAG) {
        let entry = registries.data.lookup(name)?;
        sections.push((entry.name(), entry.schema()));
    }
    if let Some(Some(name)) = peek_flag(raw, MODEL_MODULE_FLAG) {
        let entry = registries.model.lookup(name)?;
        sections.push((entry.name(), entry.schema()));
    }
    if let Some(Some(name)) = peek_flag(raw, GRAPH_MODULE_FLAG) {
        let entry = registries.graph.lookup(name)?;
        sections.push((entry.name(), entry.schema()));
    }
    Ok(sections)
}

/// Flatten sections; a flag declared twice keeps its first declaration
fn collect_schema(sections: Vec<Section>) -> Vec<(&'static str, ArgSpec)> {
    let mut seen: Vec<(&'static str, &'static str)> = Vec::new();
    let mut out = Vec::new();
    for (owner, specs) in sections {
        for spec in specs {
            if let Some((_, first)) = seen.iter().find(|(name, _)| *name == spec.name) {
                tracing::warn!(
                    "Flag '--{}' declared by both {} and {}; keeping {}'s definition",
                    spec.name, first, owner, first
                );
                continue;
            }
            seen.push((spec.name, owner));
            out.push((owner, spec));
        }
    }
    out
}

/// `Some(Some(v))` for `--name v` / `--name=v`, `Some(None)` for a bare `--name`
fn peek_flag<'a>(raw: &'a [String], name: &str) -> Option<Option<&'a str>> {
    let long = format!("--{name}");
    for (i, token) in raw.iter().enumerate() {
        if let Some(value) = token.strip_prefix(long.as_str()).and_then(|rest| rest.strip_prefix('=')) {
            return Some(Some(value));
        }
        if *token == long {
            let value = raw.get(i + 1).map(String::as_str).filter(|v| !v.starts_with("--"));
            return Some(value);
        }
    }
    None
}

fn tolerate_unknown(raw: &[String]) -> bool {
    match peek_flag(raw, TOLERATE_FLAG) {
        Some(None)        => true,
        Some(Some(value)) => parse_boolish(value).unwrap_or(false),
        None              => false,
    }
}

/// Split tokens into (kept, dropped) by whether the flag is known
fn drop_unknown(raw: &[String], known: &BTreeSet<&str>) -> (Vec<String>, Vec<String>) {
    let mut kept = Vec::new();
    let mut dropped = Vec::new();
    let mut i = 0;
    while i < raw.len() {
        let token = &raw[i];
        let name = token
            .strip_prefix("--")
            .map(|rest| rest.split('=').next().unwrap_or_default());

        match name {
            Some(name) if !name.is_empty() && !known.contains(name) && name != "help" => {
                dropped.push(token.clone());
                let inline_value = token.contains('=');
                if !inline_value {
                    if let Some(next) = raw.get(i + 1).filter(|v| !v.starts_with("--")) {
                        dropped.push(next.clone());
                        i += 1;
                    }
                }
            }
            _ => kept.push(token.clone()),
        }
        i += 1;
    }
    (kept, dropped)
}

fn build_command(schema: &[(&'static str, ArgSpec)]) -> Command {
    let mut cmd = Command::new("train")
        .bin_name("boda train")
        .about("Train a model; module flags appear once --data_module, --model_module and --graph_module are given.");

    for (owner, spec) in schema {
        let mut arg = Arg::new(spec.name)
            .long(spec.name)
            .help(spec.help)
            .help_heading(*owner)
            .required(spec.required);

        arg = match spec.kind {
            ArgKind::Int   => arg.value_parser(value_parser!(i64)),
            ArgKind::Float => arg.value_parser(parse_finite),
            ArgKind::Str   => arg.value_parser(value_parser!(String)),
            ArgKind::Bool  => arg
                .value_parser(BoolishValueParser::new())
                .num_args(0..=1)
                .default_missing_value("true"),
        }
        .action(ArgAction::Set);

        if let Some(default) = spec.default {
            arg = arg.default_value(default);
        }
        cmd = cmd.arg(arg);
    }
    cmd
}

fn to_parsed(matches: &ArgMatches, schema: &[(&'static str, ArgSpec)]) -> ParsedArgs {
    let mut parsed = ParsedArgs::new();
    for (_, spec) in schema {
        let value = match spec.kind {
            ArgKind::Int   => matches.get_one::<i64>(spec.name).copied().map(HValue::Int),
            ArgKind::Float => matches.get_one::<f64>(spec.name).copied().map(HValue::Float),
            ArgKind::Str   => matches.get_one::<String>(spec.name).cloned().map(HValue::Str),
            ArgKind::Bool  => matches.get_one::<bool>(spec.name).copied().map(HValue::Bool),
        };
        if let Some(value) = value {
            parsed.set(spec.name, value);
        }
    }
    parsed
}
