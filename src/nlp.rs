//! Boundary to the external natural-language analyzer.
//!
//! The analyzer owns question understanding: it classifies the question to a
//! template identifier and extracts the entity map. This side treats it as an
//! opaque collaborator behind [`QuestionAnalyzer`], with two bindings: a
//! subprocess (question as the final argv element, one JSON document on
//! stdout) and an HTTP endpoint (`POST {"question": ...}`). Both enforce a
//! deadline so a wedged analyzer cannot wedge the pipeline.

use std::collections::BTreeMap;
use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::NlpConfig;
use crate::error::NlpError;

/// What the analyzer concluded about one question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NlpOutcome {
    #[serde(rename = "templateId", default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub entities: BTreeMap<String, String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl NlpOutcome {
    /// The analyzer ran but could not map the question to any template.
    pub fn is_unclassified(&self) -> bool {
        match self.template_id.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(id) => id.eq_ignore_ascii_case("desconhecido"),
        }
    }
}

pub trait QuestionAnalyzer: Send + Sync {
    fn analyze(&self, question: &str) -> Result<NlpOutcome, NlpError>;
}

/// Build the analyzer binding the configuration selects. A configured
/// command wins over a configured URL.
pub fn analyzer_from_config(config: &NlpConfig) -> Result<Box<dyn QuestionAnalyzer>, NlpError> {
    let timeout = Duration::from_secs(config.timeout_secs);
    if let Some(command) = &config.command {
        let argv: Vec<String> = command.split_whitespace().map(str::to_string).collect();
        return Ok(Box::new(SubprocessAnalyzer::new(argv, timeout)?));
    }
    if let Some(url) = &config.url {
        return Ok(Box::new(HttpAnalyzer::new(url.clone(), timeout)));
    }
    Err(NlpError::Call {
        message: "no analyzer binding configured (set nlp.command or nlp.url)".to_string(),
    })
}

// ── Subprocess binding ──────────────────────────────────────────────────

pub struct SubprocessAnalyzer {
    argv: Vec<String>,
    timeout: Duration,
}

impl SubprocessAnalyzer {
    pub fn new(argv: Vec<String>, timeout: Duration) -> Result<Self, NlpError> {
        if argv.is_empty() {
            return Err(NlpError::Call {
                message: "analyzer command is empty".to_string(),
            });
        }
        Ok(Self { argv, timeout })
    }
}

impl QuestionAnalyzer for SubprocessAnalyzer {
    fn analyze(&self, question: &str) -> Result<NlpOutcome, NlpError> {
        let program = &self.argv[0];
        let mut child = Command::new(program)
            .args(&self.argv[1..])
            .arg(question)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| NlpError::Call {
                message: format!("cannot spawn {program}: {e}"),
            })?;

        // Drain both pipes off-thread so a chatty analyzer never blocks on a
        // full pipe while we poll for exit.
        let stdout_pipe = child.stdout.take().expect("stdout was piped");
        let stderr_pipe = child.stderr.take().expect("stderr was piped");
        let stdout_reader = std::thread::spawn(move || drain(stdout_pipe));
        let stderr_reader = std::thread::spawn(move || drain(stderr_pipe));

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(NlpError::Timeout {
                            seconds: self.timeout.as_secs(),
                        });
                    }
                    std::thread::sleep(Duration::from_millis(20));
                }
                Err(e) => {
                    return Err(NlpError::Call {
                        message: format!("cannot wait for {program}: {e}"),
                    });
                }
            }
        };

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            return Err(NlpError::Call {
                message: format!("analyzer exited with {status}: {}", stderr.trim()),
            });
        }
        parse_payload(&stdout)
    }
}

fn drain(mut pipe: impl Read) -> String {
    let mut buf = String::new();
    let _ = pipe.read_to_string(&mut buf);
    buf
}

/// Parse the analyzer's stdout. The whole trimmed output must be one JSON
/// document; as a concession to interpreters that log to stdout, the last
/// non-empty line is tried as a fallback.
fn parse_payload(stdout: &str) -> Result<NlpOutcome, NlpError> {
    let trimmed = stdout.trim();
    if let Ok(outcome) = serde_json::from_str(trimmed) {
        return Ok(outcome);
    }
    trimmed
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .and_then(|l| serde_json::from_str(l.trim()).ok())
        .ok_or_else(|| NlpError::Payload {
            message: format!("stdout is not a JSON analysis document: {:.120}", trimmed),
        })
}

// ── HTTP binding ────────────────────────────────────────────────────────

pub struct HttpAnalyzer {
    url: String,
    agent: ureq::Agent,
}

impl HttpAnalyzer {
    pub fn new(url: String, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { url, agent }
    }
}

impl QuestionAnalyzer for HttpAnalyzer {
    fn analyze(&self, question: &str) -> Result<NlpOutcome, NlpError> {
        let response = self
            .agent
            .post(&self.url)
            .send_json(serde_json::json!({ "question": question }))
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => NlpError::Call {
                    message: format!("analyzer returned HTTP {code}"),
                },
                ureq::Error::Transport(t) => NlpError::Call {
                    message: format!("analyzer unreachable: {t}"),
                },
            })?;
        response.into_json().map_err(|e| NlpError::Payload {
            message: format!("response body is not a JSON analysis document: {e}"),
        })
    }
}
