/// Splits `--name value...` style arguments into `(name, values)` pairs.
/// Flags without values are dropped.
pub fn extract_arguments(args: &str) -> Vec<(&str, Vec<&str>)> {
    let vec_args: Vec<&str> = args.split("--").collect();

    let arguments: Vec<(&str, Vec<&str>)> = vec_args
        .iter()
        .map(|&arg| {
            let split: Vec<&str> = arg.split_whitespace().collect();
            match split.split_first() {
                Some((name, values)) => (*name, values.to_vec()),
                None => ("", vec![]),
            }
        })
        .filter(|(name, args)| !name.is_empty() && !args.is_empty())
        .collect();

    arguments
}
