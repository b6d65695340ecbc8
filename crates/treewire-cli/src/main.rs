//! Treewire command-line tools.
//!
//! Provides the `treewire` binary for inspecting encoded expression trees
//! and signature text against the standard type registry.
//!
//! Reads defaults from environment variables; flags override them:
//! - `TREEWIRE_ALLOW_UNSAFE`: approve every call when decoding ("1"/"true")
//! - `TREEWIRE_MAX_DEPTH`: nesting limit for decoding

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing::{debug, Level};

use treewire_codec::{CodecError, DecodeOptions, EncodedExpression, ExpressionCodec};
use treewire_core::stdlib::LINQ_MODULE;
use treewire_core::{describe, ConstValue, ExprGraph, ExprTree, NodeKind, TypeRef, TypeRegistry};
use treewire_eval::{std_natives, Interpreter, InterpreterConfig, Value};

/// Exit code for codec and evaluation failures.
const EXIT_CODEC: i32 = 1;
/// Exit code for bad flags or environment.
const EXIT_USAGE: i32 = 2;
const EXIT_IO: i32 = 3;

/// Expression tree serialization tools.
#[derive(Parser)]
#[command(name = "treewire", about = "Expression tree serialization tools")]
struct Cli {
    /// Log resolution details to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Decode a JSON-encoded expression and print its description.
    Decode {
        /// Path to the encoded expression.
        #[arg(short, long)]
        input: PathBuf,

        /// Approve every call in the input.
        #[arg(long)]
        allow_unsafe: bool,

        /// Maximum nesting depth of the input.
        #[arg(long)]
        max_depth: Option<usize>,

        /// Type descriptor whose static methods may be called.
        #[arg(long = "safe-static-type", value_name = "SIG")]
        safe_static_types: Vec<String>,

        /// Type descriptor whose instance methods may be called.
        #[arg(long = "safe-instance-type", value_name = "SIG")]
        safe_instance_types: Vec<String>,

        /// Member descriptor of a single method that may be called.
        #[arg(long = "safe-method", value_name = "SIG")]
        safe_methods: Vec<String>,

        /// Invoke the decoded expression with these JSON arguments.
        #[arg(long = "arg", value_name = "JSON")]
        args: Vec<String>,

        /// Invoke even when no arguments are given.
        #[arg(long)]
        invoke: bool,
    },

    /// Resolve a type descriptor.
    ResolveType {
        signature: String,
    },

    /// Resolve a member descriptor.
    ResolveMember {
        signature: String,
    },

    /// Print the descriptor of every method on a type.
    ListMembers {
        /// Type descriptor.
        signature: String,
    },

    /// Print an encoded sample expression.
    Sample,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let types = TypeRegistry::with_std();
    let exit_code = match cli.command {
        Commands::Decode {
            input,
            allow_unsafe,
            max_depth,
            safe_static_types,
            safe_instance_types,
            safe_methods,
            args,
            invoke,
        } => {
            let flags = DecodeFlags {
                allow_unsafe,
                max_depth,
                safe_static_types,
                safe_instance_types,
                safe_methods,
            };
            run_decode(&types, &input, flags, &args, invoke)
        }
        Commands::ResolveType { signature } => run_resolve_type(&types, &signature),
        Commands::ResolveMember { signature } => run_resolve_member(&types, &signature),
        Commands::ListMembers { signature } => run_list_members(&types, &signature),
        Commands::Sample => run_sample(&types),
    };
    process::exit(exit_code);
}

struct DecodeFlags {
    allow_unsafe: bool,
    max_depth: Option<usize>,
    safe_static_types: Vec<String>,
    safe_instance_types: Vec<String>,
    safe_methods: Vec<String>,
}

/// Execute the decode subcommand.
///
/// Returns exit code: 0 = success, 1 = codec or runtime error,
/// 2 = bad configuration, 3 = I/O error.
fn run_decode(types: &TypeRegistry, input: &Path, flags: DecodeFlags, args: &[String], invoke: bool) -> i32 {
    let options = match decode_options(types, flags) {
        Ok(options) => options,
        Err(code) => return code,
    };

    let text = match std::fs::read_to_string(input) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: failed to read '{}': {}", input.display(), e);
            return EXIT_IO;
        }
    };
    let node: EncodedExpression = match serde_json::from_str(&text) {
        Ok(node) => node,
        Err(e) => {
            eprintln!("Error: '{}' is not an encoded expression: {}", input.display(), e);
            return EXIT_CODEC;
        }
    };

    let tree = match ExpressionCodec::new(types).decode_with(&node, &options) {
        Ok(tree) => tree,
        Err(e) => return report(&e),
    };
    println!("{}", describe(types, &tree));

    if !invoke && args.is_empty() {
        return 0;
    }
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        match serde_json::from_str::<serde_json::Value>(arg) {
            Ok(json) => values.push(json_to_value(&json)),
            Err(e) => {
                eprintln!("Error: argument '{}' is not JSON: {}", arg, e);
                return EXIT_USAGE;
            }
        }
    }
    let natives = std_natives(types);
    let mut interp = Interpreter::new(types, &natives, InterpreterConfig::default());
    match interp.invoke(&tree, values) {
        Ok(value) => {
            println!("{}", value);
            0
        }
        Err(e) => {
            eprintln!("Runtime error: {}", e);
            EXIT_CODEC
        }
    }
}

/// Builds decode options from the environment, then the flags.
fn decode_options(types: &TypeRegistry, flags: DecodeFlags) -> Result<DecodeOptions, i32> {
    let mut options = DecodeOptions::new();

    if let Ok(raw) = std::env::var("TREEWIRE_ALLOW_UNSAFE") {
        match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => options = options.allow_unsafe(),
            "0" | "false" | "no" | "" => {}
            _ => {
                eprintln!("Error: TREEWIRE_ALLOW_UNSAFE must be true or false, got '{}'", raw);
                return Err(EXIT_USAGE);
            }
        }
    }
    if let Ok(raw) = std::env::var("TREEWIRE_MAX_DEPTH") {
        match raw.parse::<usize>() {
            Ok(depth) => options = options.with_max_depth(depth),
            Err(_) => {
                eprintln!("Error: TREEWIRE_MAX_DEPTH must be a non-negative integer, got '{}'", raw);
                return Err(EXIT_USAGE);
            }
        }
    }

    if flags.allow_unsafe {
        options = options.allow_unsafe();
    }
    if let Some(depth) = flags.max_depth {
        options = options.with_max_depth(depth);
    }

    let codec = ExpressionCodec::new(types);
    for sig in &flags.safe_static_types {
        let ty = codec.signatures().decode_type(sig).map_err(|e| report(&e))?;
        options = options.allow_static_type(ty);
    }
    for sig in &flags.safe_instance_types {
        let ty = codec.signatures().decode_type(sig).map_err(|e| report(&e))?;
        options = options.allow_instance_type(ty);
    }
    for sig in &flags.safe_methods {
        let method = codec.signatures().decode_member(sig).map_err(|e| report(&e))?;
        options = options.allow_method(method);
    }
    debug!(?options, "decode options");
    Ok(options)
}

fn run_resolve_type(types: &TypeRegistry, signature: &str) -> i32 {
    let codec = ExpressionCodec::new(types);
    let result = codec
        .signatures()
        .decode_type(signature)
        .and_then(|ty| Ok((types.type_name(&ty), codec.signatures().encode_type(&ty)?)));
    match result {
        Ok((name, canonical)) => {
            println!("{}", name);
            println!("{}", canonical);
            0
        }
        Err(e) => report(&e),
    }
}

fn run_resolve_member(types: &TypeRegistry, signature: &str) -> i32 {
    match ExpressionCodec::new(types).signatures().decode_member(signature) {
        Ok(method) => {
            println!("{}", types.describe_method(&method));
            0
        }
        Err(e) => report(&e),
    }
}

fn run_list_members(types: &TypeRegistry, signature: &str) -> i32 {
    let codec = ExpressionCodec::new(types);
    let ty = match codec.signatures().decode_type(signature) {
        Ok(ty) => ty,
        Err(e) => return report(&e),
    };
    for method in types.methods_of(&ty) {
        match codec.signatures().encode_member(&method) {
            Ok(text) => println!("{}", text),
            Err(e) => return report(&e),
        }
    }
    0
}

fn run_sample(types: &TypeRegistry) -> i32 {
    let tree = match sample_tree(types) {
        Ok(tree) => tree,
        Err(e) => return report(&e),
    };
    match ExpressionCodec::new(types).encode(&tree) {
        Ok(node) => {
            let json = serde_json::to_string_pretty(&node)
                .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize sample: {}\"}}", e));
            println!("{}", json);
            0
        }
        Err(e) => report(&e),
    }
}

/// `xs => Count(Where(xs, x => (x > 2)))` over a `List<Int32>`.
fn sample_tree(types: &TypeRegistry) -> Result<ExprTree, CodecError> {
    let missing = |name: &str| CodecError::TypeNotFound { name: name.to_string() };
    let list = types
        .list_of(TypeRef::INT32)
        .ok_or_else(|| missing("System.Collections.Generic.List`1"))?;
    let seq = types
        .enumerable_of(TypeRef::INT32)
        .ok_or_else(|| missing("System.Collections.Generic.IEnumerable`1"))?;
    let pred = types
        .func_type(vec![TypeRef::INT32, TypeRef::BOOLEAN])
        .ok_or_else(|| missing("System.Func`2"))?;
    let enumerable = types
        .lookup("System.Linq.Enumerable", LINQ_MODULE)
        .map(TypeRef::simple)
        .ok_or_else(|| missing("System.Linq.Enumerable"))?;

    let overload = |name: &str, params: Vec<TypeRef>| -> Result<_, CodecError> {
        types
            .methods_of(&enumerable)
            .into_iter()
            .filter(|m| types.get_method(m.method).is_some_and(|d| d.name == name))
            .filter_map(|m| types.make_generic_method(&m, &[TypeRef::INT32]).ok())
            .find(|m| types.method_parameter_types(m).is_ok_and(|p| p == params))
            .ok_or_else(|| CodecError::MemberNotFound {
                signature: format!("Enumerable.{}", name),
                reason: "no matching overload".to_string(),
            })
    };
    let where_ = overload("Where", vec![seq.clone(), pred])?;
    let count = overload("Count", vec![seq])?;

    let mut g = ExprGraph::new();
    let xs = g.parameter(list, "xs");
    let x = g.parameter(TypeRef::INT32, "x");
    let test = g.make_binary(types, NodeKind::GreaterThan, g.param_ref(x)?, g.literal(ConstValue::Int32(2)), None)?;
    let predicate = g.lambda(types, vec![x], test)?;
    let filtered = g.call(types, None, where_, vec![g.param_ref(xs)?, predicate])?;
    let counted = g.call(types, None, count, vec![filtered])?;
    let root = g.lambda(types, vec![xs], counted)?;
    Ok(g.finish(root))
}

/// Maps a JSON argument to a runtime value.
///
/// Integers become `Int32` when they fit, else `Int64`; arrays become lists.
fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => i32::try_from(i).map_or(Value::Int64(i), Value::Int32),
            None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::list(items.iter().map(json_to_value)),
        serde_json::Value::Object(_) => Value::Null,
    }
}

fn report(e: &CodecError) -> i32 {
    eprintln!("Error: {}", e);
    EXIT_CODEC
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(safe_methods: Vec<String>) -> DecodeFlags {
        DecodeFlags {
            allow_unsafe: false,
            max_depth: None,
            safe_static_types: Vec::new(),
            safe_instance_types: Vec::new(),
            safe_methods,
        }
    }

    #[test]
    fn rejected_calls_can_be_approved_one_method_at_a_time() {
        let types = TypeRegistry::with_std();
        let codec = ExpressionCodec::new(&types);
        let encoded = codec.encode(&sample_tree(&types).unwrap()).unwrap();

        let mut approved = Vec::new();
        loop {
            let options = decode_options(&types, flags(approved.clone())).unwrap();
            match codec.decode_with(&encoded, &options) {
                Ok(_) => break,
                Err(CodecError::UnsafeCall { method, .. }) => {
                    assert!(approved.len() < 2, "approvals did not take effect: {:?}", approved);
                    approved.push(codec.signatures().encode_member(&method).unwrap());
                }
                Err(other) => panic!("unexpected {other:?}"),
            }
        }
        // Count, then Where.
        assert_eq!(approved.len(), 2);
    }

    #[test]
    fn unknown_safe_method_is_a_codec_error() {
        let types = TypeRegistry::with_std();
        let flags = flags(vec!["Nope@{System.String, System.Private.CoreLib}()".to_string()]);
        assert_eq!(decode_options(&types, flags).unwrap_err(), EXIT_CODEC);
    }
}
