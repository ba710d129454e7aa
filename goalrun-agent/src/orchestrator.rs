//! Non-blocking run orchestration
//!
//! `submit` only writes the submission header and pushes the request onto a
//! work queue. A dispatcher task drains the queue and spawns one worker per
//! request, so a hung backend never holds up later submissions. A cap on
//! concurrent runs is available but off unless configured.
//! Results reach the caller only through the transcript (and, structured,
//! through [`Orchestrator::last_outcome`]).

use crate::transcript::Transcript;
use goalrun_backend::{run, Backend, BackendConfig, LogEvent, RunOutcome};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Runs allowed to wait on a backend at the same time; the rest queue.
    /// `None` starts every run as soon as it is dequeued.
    pub max_concurrent_runs: Option<usize>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: None,
        }
    }
}

/// Everything one run needs; owned by that run alone
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub goal: String,
    pub command: String,
    pub config: BackendConfig,
}

impl RunRequest {
    pub fn new(goal: impl Into<String>, command: impl Into<String>, config: BackendConfig) -> Self {
        Self {
            goal: goal.into(),
            command: command.into(),
            config,
        }
    }
}

/// Identifies a submitted run in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

type LastOutcome = Arc<Mutex<Option<Arc<RunOutcome>>>>;

/// Fire-and-forget scheduler for backend runs
pub struct Orchestrator {
    queue: mpsc::UnboundedSender<(RunId, RunRequest)>,
    dispatcher: JoinHandle<()>,
    transcript: Transcript,
    next_id: AtomicU64,
    last_outcome: LastOutcome,
}

impl Orchestrator {
    /// Start the dispatcher. Must be called from within a tokio runtime.
    pub fn start(transcript: Transcript, config: OrchestratorConfig) -> Self {
        let (queue, requests) = mpsc::unbounded_channel();
        let last_outcome: LastOutcome = Arc::new(Mutex::new(None));
        let permits = config
            .max_concurrent_runs
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));

        let dispatcher = tokio::spawn(dispatch(
            requests,
            transcript.clone(),
            permits,
            last_outcome.clone(),
        ));

        Self {
            queue,
            dispatcher,
            transcript,
            next_id: AtomicU64::new(1),
            last_outcome,
        }
    }

    /// Queue a run and return immediately.
    ///
    /// Nothing about the run's success or failure is reported here; watch
    /// the transcript.
    pub fn submit(&self, request: RunRequest) -> RunId {
        let id = RunId(self.next_id.fetch_add(1, Ordering::Relaxed));

        self.transcript.emit(LogEvent::Submitted {
            backend: request.config.kind,
            goal: request.goal.clone(),
            command: request.command.clone(),
        });
        debug!(run = %id, backend = %request.config.kind, "run queued");

        if let Err(mpsc::error::SendError((id, request))) = self.queue.send((id, request)) {
            // Only possible if the dispatcher task died
            error!(run = %id, "dispatcher unavailable, run dropped");
            self.transcript
                .emit(LogEvent::failed(format!("{} agent could not be scheduled", request.config.kind)));
        }

        id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Structured outcome of the run that finished most recently
    pub fn last_outcome(&self) -> Option<Arc<RunOutcome>> {
        self.last_outcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stop accepting runs and wait for every queued and in-flight run,
    /// returning the outcome of whichever finished last.
    ///
    /// For process shutdown; individual runs are never awaited or cancelled.
    pub async fn drain(self) -> Option<Arc<RunOutcome>> {
        drop(self.queue);
        if let Err(e) = self.dispatcher.await {
            error!(error = %e, "dispatcher task failed");
        }
        self.last_outcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

async fn dispatch(
    mut requests: mpsc::UnboundedReceiver<(RunId, RunRequest)>,
    transcript: Transcript,
    permits: Option<Arc<Semaphore>>,
    last_outcome: LastOutcome,
) {
    let mut runs = JoinSet::new();

    while let Some((id, request)) = requests.recv().await {
        let permit = match &permits {
            Some(permits) => match permits.clone().acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(_) => break,
            },
            None => None,
        };
        let transcript = transcript.clone();
        let last_outcome = last_outcome.clone();

        runs.spawn(async move {
            let _permit = permit;
            let outcome = execute(id, request, &transcript).await;
            *last_outcome.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(outcome));
        });

        while let Some(finished) = runs.try_join_next() {
            log_join(finished);
        }
    }

    while let Some(finished) = runs.join_next().await {
        log_join(finished);
    }
}

async fn execute(id: RunId, request: RunRequest, transcript: &Transcript) -> RunOutcome {
    let RunRequest { goal, command, config } = request;
    let kind = config.kind;
    info!(run = %id, backend = %kind, "run started");

    let backend = match Backend::from_config(config) {
        Ok(backend) => backend,
        Err(err) => {
            error!(run = %id, backend = %kind, error = %err, "backend could not be built");
            transcript.emit(LogEvent::Started { backend: kind, goal });
            transcript.emit(LogEvent::failed(err.message()));
            return RunOutcome::failed(kind, err);
        }
    };

    let sink = transcript.clone();
    let outcome = run(&backend, &goal, &command, move |event| sink.emit(event)).await;
    info!(run = %id, backend = %kind, success = outcome.is_success(), "run finished");
    outcome
}

fn log_join(finished: Result<(), tokio::task::JoinError>) {
    if let Err(e) = finished {
        error!(error = %e, "run task panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_last_response;
    use goalrun_backend::{BackendKind, ErrorKind};
    use serde_json::json;
    use std::time::Duration;

    fn ollama_reply(text: &str) -> String {
        json!({ "response": text, "done": true }).to_string()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_runs_share_one_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let mut deepseek_server = mockito::Server::new_async().await;
        let mut mistral_server = mockito::Server::new_async().await;
        deepseek_server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(ollama_reply("print('from deepseek')"))
            .create_async()
            .await;
        mistral_server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(ollama_reply("from mistral"))
            .create_async()
            .await;

        let transcript = Transcript::new();
        let orchestrator = Orchestrator::start(transcript.clone(), OrchestratorConfig::default());

        let first = orchestrator.submit(RunRequest::new(
            "write code",
            "python main.py",
            BackendConfig::deepseek()
                .with_base_url(deepseek_server.url())
                .with_output_dir(dir.path()),
        ));
        let second = orchestrator.submit(RunRequest::new(
            "write prose",
            "",
            BackendConfig::mistral()
                .with_base_url(mistral_server.url())
                .with_output_dir(dir.path()),
        ));
        assert_ne!(first, second);

        orchestrator.drain().await;

        let events = transcript.events();
        let count = |needle: &str| events.iter().filter(|e| e.as_str() == needle).count();

        assert_eq!(count("\n🧠 Starting DeepSeek agent with goal: write code"), 1);
        assert_eq!(count("\n🤖 LLM Response:\nprint('from deepseek')"), 1);
        assert_eq!(count("\n✅ Goal achieved by DeepSeek agent."), 1);
        assert_eq!(count("\n🧠 Starting Mistral agent with goal: write prose"), 1);
        assert_eq!(count("\n🎨 LLM Response:\nfrom mistral"), 1);
        assert_eq!(count("\n✅ Task completed by Mistral agent."), 1);
        // 2 headers + 2 x (started, command, response, completed, saved)
        assert_eq!(events.len(), 12);

        assert_eq!(
            std::fs::read_to_string(dir.path().join("generated_script.py")).unwrap(),
            "print('from deepseek')"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("generated_text.txt")).unwrap(),
            "from mistral"
        );

        let latest = extract_last_response(&transcript.text()).unwrap();
        assert!(latest == "from mistral" || latest == "print('from deepseek')");
    }

    #[tokio::test]
    async fn test_submit_returns_before_run_finishes() {
        let transcript = Transcript::new();
        let orchestrator = Orchestrator::start(transcript.clone(), OrchestratorConfig::default());

        orchestrator.submit(RunRequest::new(
            "g",
            "c",
            BackendConfig::deepseek().with_base_url("http://127.0.0.1:9"),
        ));

        // only the header is guaranteed to be there synchronously
        assert!(transcript.text().starts_with("\n🎯 Goal: g\n💬 Command: c\n⚙️ Using LLM: DeepSeek"));

        orchestrator.drain().await;
        assert!(transcript.events().last().unwrap().starts_with("\n❌ Error: "));
    }

    #[tokio::test]
    async fn test_missing_credentials_surface_in_transcript() {
        let transcript = Transcript::new();
        let orchestrator = Orchestrator::start(transcript.clone(), OrchestratorConfig::default());

        orchestrator.submit(RunRequest::new(
            "goal",
            "",
            BackendConfig::for_kind(BackendKind::Nano),
        ));
        let outcome = orchestrator.drain().await.unwrap();

        let events = transcript.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1], "\n🧠 Starting Nano agent with goal: goal");
        assert_eq!(events[2], "\n❌ Error: an API key is required for Nano");

        assert_eq!(outcome.backend, BackendKind::Nano);
        assert_eq!(outcome.result.as_ref().unwrap_err().kind(), ErrorKind::ConfigInvalid);
    }

    #[tokio::test]
    async fn test_run_ids_are_distinct() {
        let orchestrator = Orchestrator::start(Transcript::new(), OrchestratorConfig { max_concurrent_runs: Some(1) });
        let ids: Vec<RunId> = (0..3)
            .map(|_| orchestrator.submit(RunRequest::new("", "", BackendConfig::for_kind(BackendKind::Gemini))))
            .collect();
        orchestrator.drain().await;

        assert_eq!(ids[0].to_string(), "run-1");
        assert!(ids[0] < ids[1] && ids[1] < ids[2]);
    }

    async fn wait_for(transcript: &Transcript, needle: &str) -> bool {
        let poll = async {
            while !transcript.events().iter().any(|e| e == needle) {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(10), poll).await.is_ok()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_hung_backends_do_not_hold_up_later_runs() {
        let dir = tempfile::tempdir().unwrap();
        // Accepts connections into the backlog but never answers
        let silent = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let silent_url = format!("http://{}", silent.local_addr().unwrap());

        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(ollama_reply("still here"))
            .create_async()
            .await;

        let transcript = Transcript::new();
        let orchestrator = Orchestrator::start(transcript.clone(), OrchestratorConfig::default());

        for _ in 0..6 {
            orchestrator.submit(RunRequest::new(
                "hang",
                "",
                BackendConfig::deepseek()
                    .with_base_url(silent_url.clone())
                    .with_output_dir(dir.path()),
            ));
        }
        orchestrator.submit(RunRequest::new(
            "answer",
            "",
            BackendConfig::mistral()
                .with_base_url(server.url())
                .with_output_dir(dir.path()),
        ));

        assert!(wait_for(&transcript, "\n✅ Task completed by Mistral agent.").await);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("generated_text.txt")).unwrap(),
            "still here"
        );
        // the hung runs are abandoned with the runtime; drain would wait on them
        drop(orchestrator);
    }

    #[tokio::test]
    async fn test_last_outcome_visible_once_run_finishes() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(ollama_reply("def f(): pass"))
            .create_async()
            .await;

        let transcript = Transcript::new();
        let orchestrator = Orchestrator::start(transcript.clone(), OrchestratorConfig::default());
        assert!(orchestrator.last_outcome().is_none());

        orchestrator.submit(RunRequest::new(
            "g",
            "c",
            BackendConfig::deepseek()
                .with_base_url(server.url())
                .with_output_dir(dir.path()),
        ));
        let saved = dir.path().join("generated_script.py");
        let expected_saved = format!("\n💾 Saved output to file: {}", saved.display());
        assert!(wait_for(&transcript, &expected_saved).await);

        // the outcome is stored right after the run's last event; give it a moment
        let poll = async {
            loop {
                if let Some(outcome) = orchestrator.last_outcome() {
                    return outcome;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };
        let outcome = tokio::time::timeout(Duration::from_secs(5), poll).await.unwrap();

        assert_eq!(outcome.backend, BackendKind::DeepSeek);
        assert_eq!(outcome.reply(), Some("def f(): pass"));
        assert_eq!(outcome.saved_to.as_deref(), Some(saved.as_path()));

        orchestrator.drain().await;
    }
}
