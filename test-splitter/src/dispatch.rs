// Copyright (c) The test-splitter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError,
    errors::Result,
    output::{OutputContext, OutputOpts, OutputWriter, clap_styles},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use splitter_runner::{
    config::SplitterConfig,
    partition::NodeSpec,
    split::{SplitOpts, SplitPlan, plan_with_timing, split, split_with_timing},
};
use std::io::Write;

/// Split Gradle test classes across CI nodes.
///
/// Prints the `--tests` arguments the current node should pass to Gradle. If JUnit reports
/// from a previous run are available, individual test cases are balanced by their recorded
/// durations; otherwise test classes are divided between nodes by count.
#[derive(Debug, Parser)]
#[command(version, styles = clap_styles::style(), max_term_width = 100)]
pub struct TestSplitterApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(flatten)]
    config_opts: ConfigOpts,

    #[clap(subcommand)]
    command: Command,
}

impl TestSplitterApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the exit code on success.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let config = self.config_opts.make_config()?;
        self.command.exec(&config, output, output_writer)?;
        Ok(crate::SplitterExitCode::OK)
    }
}

#[derive(Debug, Args)]
struct ConfigOpts {
    /// Config file [default: .config/test-splitter.toml]
    #[arg(long, global = true, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,
}

impl ConfigOpts {
    fn make_config(&self) -> Result<SplitterConfig> {
        Ok(SplitterConfig::from_sources(
            Utf8Path::new("."),
            self.config_file.as_deref(),
        )?)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the tests this node should run
    ///
    /// With --test-result-path, test cases are balanced by the durations recorded in JUnit
    /// reports from a previous run. If any test class is missing a report, or if
    /// --test-result-path isn't passed in, test classes are divided between nodes by count.
    Split {
        #[clap(flatten)]
        selection: SelectionOpts,

        /// Zero-based index of this node
        #[arg(
            long,
            env = "CI_NODE_INDEX",
            allow_negative_numbers = true,
            value_name = "INDEX"
        )]
        node_index: i64,

        /// Total number of nodes
        #[arg(
            long,
            env = "CI_NODE_TOTAL",
            allow_negative_numbers = true,
            value_name = "TOTAL"
        )]
        node_total: i64,

        /// Directory containing JUnit reports from a previous run
        #[arg(long, value_name = "DIR")]
        test_result_path: Option<Utf8PathBuf>,
    },

    /// Show how tests would be divided across every node
    ///
    /// Prints a summary line per node with the number of tests and their recorded duration.
    /// Pass --verbose to also list the tests in each shard.
    Plan {
        #[clap(flatten)]
        selection: SelectionOpts,

        /// Total number of nodes
        #[arg(
            long,
            env = "CI_NODE_TOTAL",
            allow_negative_numbers = true,
            value_name = "TOTAL"
        )]
        node_total: i64,

        /// Directory containing JUnit reports from a previous run
        #[arg(long, value_name = "DIR")]
        test_result_path: Utf8PathBuf,
    },
}

impl Command {
    fn exec(
        self,
        config: &SplitterConfig,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<()> {
        match self {
            Command::Split {
                selection,
                node_index,
                node_total,
                test_result_path,
            } => {
                let node = NodeSpec::new(node_index, node_total)?;
                let opts = selection.make_opts(config);
                let tests = match test_result_path {
                    Some(report_root) => split_with_timing(&opts, &report_root, node)?,
                    None => split(&opts, node)?,
                };

                let mut writer = output_writer.stdout_writer();
                writeln!(writer, "{tests}").map_err(ExpectedError::write_output_error)?;
                writer.flush().map_err(ExpectedError::write_output_error)
            }
            Command::Plan {
                selection,
                node_total,
                test_result_path,
            } => {
                let total = NodeSpec::new(0, node_total)?.total_shards();
                let opts = selection.make_opts(config);
                let plan = plan_with_timing(&opts, &test_result_path, total)?;

                let mut writer = output_writer.stdout_writer();
                write_plan(&plan, output.verbose, &mut writer)
                    .map_err(ExpectedError::write_output_error)?;
                writer.flush().map_err(ExpectedError::write_output_error)
            }
        }
    }
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Selection options")]
struct SelectionOpts {
    /// Directory to look for test sources in
    #[arg(long, value_name = "DIR")]
    test_path: Utf8PathBuf,

    /// Test source file names to skip, separated by commas or newlines
    ///
    /// May be passed in multiple times. Excluded files are added to the ones in the config.
    #[arg(long, value_name = "FILES")]
    exclude: Vec<String>,
}

impl SelectionOpts {
    fn make_opts(&self, config: &SplitterConfig) -> SplitOpts {
        let mut opts = SplitOpts::new(self.test_path.clone(), config.discovery.clone());
        opts.set_exclude(self.exclude_entries());
        opts
    }

    fn exclude_entries(&self) -> impl Iterator<Item = &str> {
        self.exclude
            .iter()
            .flat_map(|value| value.split([',', '\n']))
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
    }
}

fn write_plan(plan: &SplitPlan, verbose: bool, writer: &mut dyn Write) -> std::io::Result<()> {
    let total = plan.node_total();
    match plan {
        SplitPlan::Timing {
            target_secs,
            shards,
        } => {
            writeln!(writer, "target: {target_secs:.3}s per shard")?;
            for shard in shards {
                writeln!(writer, "{}", shard.summary(total))?;
                if verbose {
                    for name in shard.test_names() {
                        writeln!(writer, "    {name}")?;
                    }
                }
            }
        }
        SplitPlan::RoundRobin { shards } => {
            writeln!(
                writer,
                "timings are out of sync, dividing test classes by count"
            )?;
            for (index, classes) in shards.iter().enumerate() {
                let names: Vec<_> = classes.iter().map(|class| class.as_str()).collect();
                writeln!(writer, "shard {}/{total}: {}", index + 1, names.join(" "))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SplitterExitCode;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn fixtures_dir() -> Utf8PathBuf {
        Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../fixtures")
    }

    fn run(args: &[&str]) -> Result<String> {
        let app = TestSplitterApp::try_parse_from(
            std::iter::once("test-splitter").chain(args.iter().copied()),
        )
        .expect("arguments are valid");
        let mut writer = OutputWriter::Test { stdout: Vec::new() };
        app.exec(OutputContext::for_tests(), &mut writer)?;
        let OutputWriter::Test { stdout } = writer else {
            unreachable!("writer was created as a test writer")
        };
        Ok(String::from_utf8(stdout).expect("output is valid UTF-8"))
    }

    #[test]
    fn verify_app() {
        use clap::CommandFactory;
        TestSplitterApp::command().debug_assert();
    }

    #[test]
    fn exclude_entries_are_split_and_trimmed() {
        let app = TestSplitterApp::try_parse_from([
            "test-splitter",
            "split",
            "--test-path",
            "src",
            "--node-index",
            "0",
            "--node-total",
            "1",
            "--exclude",
            "Hello1Test.kt, Hello2Test.kt,",
            "--exclude",
            "Hello3Test.kt\n\nHello4Test.kt",
        ])
        .expect("arguments are valid");

        let Command::Split { selection, .. } = &app.command else {
            panic!("expected split, found {:?}", app.command);
        };
        let entries: Vec<_> = selection.exclude_entries().collect();
        assert_eq!(
            entries,
            [
                "Hello1Test.kt",
                "Hello2Test.kt",
                "Hello3Test.kt",
                "Hello4Test.kt"
            ]
        );
    }

    #[test]
    fn split_by_count() {
        let test_path = fixtures_dir().join("test-1");
        let output = run(&[
            "split",
            "--test-path",
            test_path.as_str(),
            "--node-index",
            "1",
            "--node-total",
            "2",
        ])
        .expect("split succeeds");
        assert_eq!(output, "--tests Hello2Test\n");
    }

    #[test]
    fn split_by_count_with_exclude() {
        let test_path = fixtures_dir().join("test-1");
        let output = run(&[
            "split",
            "--test-path",
            test_path.as_str(),
            "--node-index",
            "0",
            "--node-total",
            "1",
            "--exclude",
            "Hello1Test.kt,Hello3Test.kt",
        ])
        .expect("split succeeds");
        assert_eq!(output, "--tests Hello2Test\n");
    }

    #[test]
    fn split_with_timing() {
        let test_path = fixtures_dir().join("test-1");
        let report_root = fixtures_dir().join("test-result/test-app-result");
        let output = run(&[
            "split",
            "--test-path",
            test_path.as_str(),
            "--test-result-path",
            report_root.as_str(),
            "--node-index",
            "0",
            "--node-total",
            "3",
        ])
        .expect("split succeeds");
        assert_eq!(
            output,
            "--tests \"com.sample.Hello1Test.verify 1\" \
             --tests \"com.sample.Hello1Test.verify 2\" \
             --tests \"com.sample.Hello1Test.verify 3\" \
             --tests \"com.sample.Hello2Test.verify 1\"\n"
        );
    }

    #[test]
    fn plan_with_timing() {
        let test_path = fixtures_dir().join("test-1");
        let report_root = fixtures_dir().join("test-result/test-app-result");
        let output = run(&[
            "plan",
            "--test-path",
            test_path.as_str(),
            "--test-result-path",
            report_root.as_str(),
            "--node-total",
            "3",
        ])
        .expect("plan succeeds");
        assert_eq!(
            output,
            "target: 2.000s per shard\n\
             shard 1/3: 4 tests, 2.000s\n\
             shard 2/3: 5 tests, 1.750s\n\
             shard 3/3: 7 tests, 2.250s\n"
        );
    }

    #[test]
    fn plan_out_of_sync() {
        let test_path = fixtures_dir().join("test-1");
        let report_root = fixtures_dir().join("test-result/test-app2-result");
        let output = run(&[
            "plan",
            "--test-path",
            test_path.as_str(),
            "--test-result-path",
            report_root.as_str(),
            "--node-total",
            "2",
        ])
        .expect("plan succeeds");
        assert_eq!(
            output,
            "timings are out of sync, dividing test classes by count\n\
             shard 1/2: Hello1Test Hello3Test\n\
             shard 2/2: Hello2Test\n"
        );
    }

    #[test_case(&["split", "--test-path", "src", "--node-index", "-1", "--node-total", "2"] ; "negative index")]
    #[test_case(&["split", "--test-path", "src", "--node-index", "0", "--node-total", "0"] ; "zero total")]
    #[test_case(&["split", "--test-path", "src", "--node-index", "2", "--node-total", "2"] ; "index out of bounds")]
    #[test_case(&["split", "--test-path", "", "--node-index", "0", "--node-total", "1"] ; "empty test path")]
    #[test_case(&["plan", "--test-path", "src", "--test-result-path", "out", "--node-total", "-3"] ; "negative plan total")]
    fn setup_errors(args: &[&str]) {
        let err = run(args).expect_err("invocation is rejected");
        assert_eq!(err.process_exit_code(), SplitterExitCode::SETUP_ERROR);
    }

    #[test]
    fn missing_config_file() {
        let err = run(&[
            "split",
            "--config-file",
            "does-not-exist.toml",
            "--test-path",
            "src",
            "--node-index",
            "0",
            "--node-total",
            "1",
        ])
        .expect_err("missing config file is rejected");
        assert!(
            matches!(err, ExpectedError::ConfigParseError { .. }),
            "unexpected error: {err:?}"
        );
        assert_eq!(err.process_exit_code(), SplitterExitCode::SETUP_ERROR);
    }
}
