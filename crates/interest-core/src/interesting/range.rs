//! `range`: repeat a wrapped test over an inclusive integer range.
//!
//! Each occurrence of the range token (default `RANGENUM`) in the wrapped
//! test's arguments is replaced by the current iteration number. The first
//! interesting iteration ends the run.
//!
//! Intermittent testcases, repeated until the bug shows up:
//!
//! ```text
//! interest range 1 20 hangs 9 ./js --fuzzing-safe testcase.js
//! ```
//!
//! Unstable testcases, varying a number the testcase reads:
//!
//! ```text
//! interest range 1 20 hangs 9 ./js --fuzzing-safe -e "n=RANGENUM;" testcase.js
//! ```
//!
//! Substitution is a plain substring replacement, so a token embedded in a
//! larger word (`schedulegc(RANGENUM);`) is replaced too. It applies only to
//! the wrapped test's arguments, never to the wrapped test's name.

use clap::Parser;

use super::{InterestingnessTest, TestContext, TestError};
use crate::logging::TestEvent;

/// Registry name.
pub const NAME: &str = "range";

/// Token replaced by the iteration number unless `-n/--rangenum` overrides it.
pub const DEFAULT_RANGE_TOKEN: &str = "RANGENUM";

#[derive(Parser, Debug)]
#[command(name = "range", disable_help_flag = true, disable_version_flag = true)]
struct RangeArgs {
    /// Substring replaced by the iteration number in the wrapped test's arguments
    #[arg(short = 'n', long = "rangenum", default_value = DEFAULT_RANGE_TOKEN)]
    range_num: String,

    /// LOOP_MIN LOOP_MAX TEST [TEST_ARGS...]
    #[arg(trailing_var_arg = true, allow_negative_numbers = true)]
    cmd_with_flags: Vec<String>,
}

/// Validated iteration bounds plus the substitution token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec {
    loop_min: u64,
    loop_max: u64,
    token: String,
}

impl RangeSpec {
    /// Validate `1 <= loop_min <= loop_max` and a non-empty token.
    pub fn new(loop_min: u64, loop_max: u64, token: impl Into<String>) -> Result<Self, TestError> {
        if loop_min < 1 {
            return Err(TestError::InvalidRange {
                loop_min,
                loop_max,
                reason: "minimum number of iterations should be at least 1",
            });
        }
        if loop_max < loop_min {
            return Err(TestError::InvalidRange {
                loop_min,
                loop_max,
                reason: "maximum must not be below minimum",
            });
        }
        let token = token.into();
        if token.is_empty() {
            return Err(TestError::InvalidArgs {
                test: NAME.to_string(),
                message: "range token must not be empty".to_string(),
            });
        }
        Ok(Self {
            loop_min,
            loop_max,
            token,
        })
    }

    pub fn loop_min(&self) -> u64 {
        self.loop_min
    }

    pub fn loop_max(&self) -> u64 {
        self.loop_max
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Number of iterations in the range.
    pub fn iterations(&self) -> u64 {
        self.loop_max - self.loop_min + 1
    }

    /// Lazily generate `(number, substituted args)` for every iteration, ascending.
    ///
    /// Each call starts a fresh pass over the range.
    pub fn candidates<'a>(&'a self, args: &'a [String]) -> Candidates<'a> {
        Candidates {
            spec: self,
            args,
            next: Some(self.loop_min),
        }
    }
}

/// Replace every occurrence of `token` in each argument with `number`.
pub fn substitute(args: &[String], token: &str, number: u64) -> Vec<String> {
    let value = number.to_string();
    args.iter().map(|arg| arg.replace(token, &value)).collect()
}

/// Iterator over the candidate argument lists of a [`RangeSpec`].
#[derive(Debug, Clone)]
pub struct Candidates<'a> {
    spec: &'a RangeSpec,
    args: &'a [String],
    next: Option<u64>,
}

impl Iterator for Candidates<'_> {
    type Item = (u64, Vec<String>);

    fn next(&mut self) -> Option<Self::Item> {
        let number = self.next?;
        self.next = if number < self.spec.loop_max {
            Some(number + 1)
        } else {
            None
        };
        Some((number, substitute(self.args, &self.spec.token, number)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next {
            None => (0, Some(0)),
            Some(n) => match usize::try_from(self.spec.loop_max - n + 1) {
                Ok(remaining) => (remaining, Some(remaining)),
                Err(_) => (usize::MAX, None),
            },
        }
    }
}

/// Parsed `range` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeInvocation {
    pub spec: RangeSpec,
    /// Name or path of the wrapped test. Never substituted.
    pub test_name: String,
    /// The wrapped test's own arguments, before substitution.
    pub test_args: Vec<String>,
}

/// Parse `[-n TOKEN] LOOP_MIN LOOP_MAX TEST [TEST_ARGS...]`.
///
/// The flag must come before the positionals; everything after `LOOP_MIN`
/// is taken verbatim.
pub fn parse_range_args(args: &[String]) -> Result<RangeInvocation, TestError> {
    let parsed = RangeArgs::try_parse_from(std::iter::once(NAME).chain(args.iter().map(String::as_str)))
        .map_err(|e| TestError::InvalidArgs {
            test: NAME.to_string(),
            message: e.to_string().trim().to_string(),
        })?;

    let mut rest = parsed.cmd_with_flags.into_iter();
    let loop_min = parse_bound("loop_min", rest.next())?;
    let loop_max = parse_bound("loop_max", rest.next())?;
    let spec = RangeSpec::new(loop_min, loop_max, parsed.range_num)?;
    let test_name = rest.next().ok_or(TestError::MissingArgument("test"))?;

    Ok(RangeInvocation {
        spec,
        test_name,
        test_args: rest.collect(),
    })
}

fn parse_bound(name: &'static str, raw: Option<String>) -> Result<u64, TestError> {
    let raw = raw.ok_or(TestError::MissingArgument(name))?;
    raw.trim()
        .parse()
        .map_err(|_| TestError::InvalidNumber { name, value: raw })
}

/// Composite test that re-runs a wrapped test across a range.
#[derive(Debug)]
pub struct RangeTest {
    ctx: TestContext,
}

impl RangeTest {
    pub fn new(ctx: TestContext) -> Self {
        Self { ctx }
    }
}

impl InterestingnessTest for RangeTest {
    fn name(&self) -> &str {
        NAME
    }

    fn interesting(&mut self, args: &[String], temp_prefix: &str) -> Result<bool, TestError> {
        let invocation = parse_range_args(args)?;
        let spec = &invocation.spec;

        let mut wrapped = self.ctx.resolve(&invocation.test_name)?;
        wrapped.init(&invocation.test_args)?;

        let sink = self.ctx.sink();
        sink.emit(&TestEvent::RangeStarted {
            test: invocation.test_name.clone(),
            loop_min: spec.loop_min(),
            loop_max: spec.loop_max(),
            token: spec.token().to_string(),
        });

        let mut iterations = 0;
        for (number, candidate) in spec.candidates(&invocation.test_args) {
            iterations += 1;
            sink.emit(&TestEvent::RangeIteration { number });
            if wrapped.interesting(&candidate, temp_prefix)? {
                sink.emit(&TestEvent::RangeFinished {
                    interesting: true,
                    iterations,
                });
                return Ok(true);
            }
        }

        sink.emit(&TestEvent::RangeFinished {
            interesting: false,
            iterations,
        });
        Ok(false)
    }
}
