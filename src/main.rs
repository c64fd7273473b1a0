use std::{fs, process};

use serde::Serialize;
use serde_json::Value;
use storefront_query::{
    api::{CacheUpdateMatrix, Mutation, Query, QueryDefinition, RequestOptions},
    cache::CacheEffectSet,
    config::{self, OperationsArgs, PlanArgs, Settings},
    infra::{error::InfraError, telemetry},
    params::{OperationSchema, Params, ensure_required, merge},
};
use tracing::{Dispatch, Level, debug, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

fn main() {
    if let Err(error) = run() {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &InfraError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

fn run() -> Result<(), InfraError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| InfraError::configuration(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging)?;

    match cli_args.command {
        config::Command::Operations(args) => run_operations(&args),
        config::Command::Plan(args) => run_plan(&settings, &args),
    }
}

#[derive(Serialize)]
struct OperationRow {
    kind: &'static str,
    name: &'static str,
    required: &'static [&'static str],
    optional: &'static [&'static str],
}

impl OperationRow {
    fn new(kind: &'static str, schema: &'static OperationSchema) -> Self {
        Self {
            kind,
            name: schema.name,
            required: schema.required,
            optional: schema.optional,
        }
    }
}

fn run_operations(args: &OperationsArgs) -> Result<(), InfraError> {
    let queries = Query::all()
        .filter(|_| !args.mutations)
        .map(|query| OperationRow::new("query", query.schema()));
    let mutations =
        Mutation::all().map(|mutation| OperationRow::new("mutation", mutation.schema()));
    let rows: Vec<OperationRow> = queries.chain(mutations).collect();

    info!(operations = rows.len(), "Listing operations");
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

#[derive(Serialize)]
struct PlanOutput<'a> {
    mutation: &'static str,
    customer_id: Option<&'a str>,
    request: &'a RequestOptions,
    effects: &'a CacheEffectSet,
}

fn run_plan(settings: &Settings, args: &PlanArgs) -> Result<(), InfraError> {
    let mutation = Mutation::from_name(&args.mutation)?;

    let call: Params = args
        .params
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    let merged = merge(&settings.client.default_params(), &call);
    ensure_required(&merged, mutation.schema())?;

    let mut request = RequestOptions::new(merged);
    if let Some(body) = args.body.as_deref() {
        request = request.with_body(serde_json::from_str(body)?);
    }
    let response = read_response(args)?;

    let customer_id = args.customer_id.as_deref();
    let effects = mutation.cache_effects(customer_id, &request, &response);
    debug!(mutation = %mutation, effects = %effects, "Planned cache effects");

    let output = PlanOutput {
        mutation: mutation.name(),
        customer_id,
        request: &request,
        effects: &effects,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn read_response(args: &PlanArgs) -> Result<Value, InfraError> {
    let raw = match (&args.response, &args.response_file) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) => fs::read_to_string(path)?,
        (None, None) => return Ok(Value::Null),
    };
    if raw.trim().is_empty() {
        return Err(InfraError::invalid_input("response body is empty"));
    }
    Ok(serde_json::from_str(&raw)?)
}
