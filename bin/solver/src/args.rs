//! Manual `std::env::args()` scanning for the single-dash, slash-argument
//! flag grammar this binary's CLI surface must recognise verbatim — a
//! conventional `clap`-derived double-dash parser doesn't fit this grammar
//! (see the coordination design's configuration notes).
use crate::error::CliError;

#[derive(Debug, Default, Clone)]
pub struct CliArgs {
    pub worker: bool,
    pub parallel: Option<usize>,
    pub partition: Option<(usize, usize)>,
    pub partition_range: Option<(usize, usize, usize)>,
    pub partition_order: Option<String>,
    pub first_move_partition: Option<(usize, usize)>,
    pub first_move_queue: Option<usize>,
    pub single_combo: Option<usize>,
    pub probe: Option<Option<u64>>,
    pub rebalance: Option<Option<u64>>,
}

fn parse_pair(s: &str, flag: &str) -> Result<(usize, usize), CliError> {
    let (a, b) = s.split_once('/').ok_or_else(|| CliError(format!("{flag} expects N/M, got {s:?}")))?;
    let a = a.parse().map_err(|_| CliError(format!("{flag}: bad numerator {a:?}")))?;
    let b = b.parse().map_err(|_| CliError(format!("{flag}: bad denominator {b:?}")))?;
    Ok((a, b))
}

fn parse_triple(s: &str, flag: &str) -> Result<(usize, usize, usize), CliError> {
    let mut parts = s.split('/');
    let (Some(start), Some(stride), Some(max)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(CliError(format!("{flag} expects start/stride/max, got {s:?}")));
    };
    if parts.next().is_some() {
        return Err(CliError(format!("{flag} expects exactly three slash-separated fields, got {s:?}")));
    }
    let start = start.parse().map_err(|_| CliError(format!("{flag}: bad start {start:?}")))?;
    let stride = stride.parse().map_err(|_| CliError(format!("{flag}: bad stride {stride:?}")))?;
    let max = max.parse().map_err(|_| CliError(format!("{flag}: bad max {max:?}")))?;
    Ok((start, stride, max))
}

/// `-probe`/`-rebalance` take an optional numeric argument; only consume the
/// next token as that argument if it actually parses as one.
fn peek_optional_u64(args: &[String], i: &mut usize) -> Option<u64> {
    let next = args.get(*i + 1)?;
    let value = next.parse().ok()?;
    *i += 1;
    Some(value)
}

pub fn parse(args: &[String]) -> Result<CliArgs, CliError> {
    let mut out = CliArgs::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-worker" => out.worker = true,
            "-parallel" => {
                i += 1;
                let v = args.get(i).ok_or_else(|| CliError("-parallel expects N".to_string()))?;
                out.parallel = Some(v.parse().map_err(|_| CliError(format!("-parallel: bad N {v:?}")))?);
            }
            "-partition" => {
                i += 1;
                let v = args.get(i).ok_or_else(|| CliError("-partition expects N/M".to_string()))?;
                out.partition = Some(parse_pair(v, "-partition")?);
            }
            "-partition-range" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| CliError("-partition-range expects start/stride/max".to_string()))?;
                out.partition_range = Some(parse_triple(v, "-partition-range")?);
            }
            "-partition-order" => {
                i += 1;
                let v = args.get(i).ok_or_else(|| CliError("-partition-order expects a kpc permutation".to_string()))?;
                out.partition_order = Some(v.clone());
            }
            "-first-move-partition" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| CliError("-first-move-partition expects N/M".to_string()))?;
                out.first_move_partition = Some(parse_pair(v, "-first-move-partition")?);
            }
            "-first-move-queue" => {
                i += 1;
                let v = args.get(i).ok_or_else(|| CliError("-first-move-queue expects N".to_string()))?;
                out.first_move_queue = Some(v.parse().map_err(|_| CliError(format!("-first-move-queue: bad N {v:?}")))?);
            }
            "-single-combo" => {
                i += 1;
                let v = args.get(i).ok_or_else(|| CliError("-single-combo expects an index".to_string()))?;
                out.single_combo = Some(v.parse().map_err(|_| CliError(format!("-single-combo: bad index {v:?}")))?);
            }
            "-probe" => out.probe = Some(peek_optional_u64(args, &mut i)),
            "-rebalance" => out.rebalance = Some(peek_optional_u64(args, &mut i)),
            other => return Err(CliError(format!("unrecognised flag {other:?}"))),
        }
        i += 1;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_parallel_and_partition() {
        let parsed = parse(&args(&["-parallel", "4", "-partition", "1/2"])).unwrap();
        assert_eq!(parsed.parallel, Some(4));
        assert_eq!(parsed.partition, Some((1, 2)));
    }

    #[test]
    fn parses_partition_range() {
        let parsed = parse(&args(&["-partition-range", "0/4/61440"])).unwrap();
        assert_eq!(parsed.partition_range, Some((0, 4, 61440)));
    }

    #[test]
    fn probe_without_argument_takes_no_timeout() {
        let parsed = parse(&args(&["-probe"])).unwrap();
        assert_eq!(parsed.probe, Some(None));
    }

    #[test]
    fn probe_with_argument_consumes_the_timeout() {
        let parsed = parse(&args(&["-probe", "30"])).unwrap();
        assert_eq!(parsed.probe, Some(Some(30)));
    }

    #[test]
    fn probe_followed_by_another_flag_does_not_eat_it() {
        let parsed = parse(&args(&["-probe", "-worker"])).unwrap();
        assert_eq!(parsed.probe, Some(None));
        assert!(parsed.worker);
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(parse(&args(&["-bogus"])).is_err());
    }

    #[test]
    fn malformed_pair_is_rejected() {
        assert!(parse(&args(&["-partition", "not-a-pair"])).is_err());
    }
}
