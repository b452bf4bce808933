use eyre::WrapErr;
use portal_core::{
    config::{Configuration, ProcessorDecl},
    line_protocol, Metric,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ShimStats {
    pub processed: usize,
    pub rejected: usize,
}

/// Drives the configured processors the way the host agent's `execd` processor expects:
/// line protocol in, line protocol out, one metric per line.
pub struct Shim {
    processors: Vec<ProcessorDecl>,
}

impl Shim {
    /// Initializes every processor in declaration order. The first failure stops startup.
    pub async fn init(conf: Configuration) -> eyre::Result<Self> {
        let mut processors = conf.processors;

        for decl in processors.iter_mut() {
            tracing::info!(target = "shim", "Initializing processor '{}'", decl.name);

            decl.processor
                .init()
                .await
                .wrap_err_with(|| format!("Error when initializing processor '{}'", decl.name))?;
        }

        Ok(Self { processors })
    }

    pub fn process(&self, metrics: Vec<Metric>) -> Vec<Metric> {
        self.processors
            .iter()
            .fold(metrics, |metrics, decl| decl.processor.apply(metrics))
    }

    /// Runs until `reader` reaches end of input.
    ///
    /// Lines that are not valid UTF-8 or not valid line protocol are logged and dropped. Output
    /// is flushed after every input line so the host never waits on a buffered metric.
    pub async fn run<R, W>(&self, mut reader: R, mut writer: W) -> eyre::Result<ShimStats>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut stats = ShimStats::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();

            let read = reader
                .read_until(b'\n', &mut buf)
                .await
                .wrap_err("Error when reading metrics from input")?;

            if read == 0 {
                break;
            }

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(e) => {
                    tracing::error!(target = "shim", "Dropping line that is not UTF-8: {}", e);
                    stats.rejected += 1;
                    continue;
                }
            };

            let metric = match line_protocol::parse_line(line) {
                Ok(Some(metric)) => metric,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!(
                        target = "shim",
                        "Dropping invalid line '{}': {}",
                        line.trim_end(),
                        e
                    );
                    stats.rejected += 1;
                    continue;
                }
            };

            for metric in self.process(vec![metric]) {
                let mut out = line_protocol::encode(&metric);
                out.push('\n');

                writer
                    .write_all(out.as_bytes())
                    .await
                    .wrap_err("Error when writing metrics to output")?;
            }

            writer
                .flush()
                .await
                .wrap_err("Error when flushing output")?;

            stats.processed += 1;
        }

        tracing::debug!(target = "shim", "Input closed");

        Ok(stats)
    }
}
