use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::api::{Action, Dispatcher, Outcome, RequestPayload, ResponsePayload};
use crate::editor::{EditorSnapshot, Language};
use crate::message::{CodeAttachment, Message, MessageLog, Sender};

/// Canned acknowledgment for plain chat messages. The backend exposes no
/// chat endpoint, so sends are answered locally and the user is pointed at
/// the editor actions.
const SEND_ACK: &str = "I'm analyzing your request... Use the editor actions \
(Debug, Analyze, Convert, All-in-One) to run your code through the mentor.";

const ALL_IN_ONE_INTENT: &str = "Run a comprehensive analysis of my code";

/// A user-initiated action. Everything except `Send` reads the editor
/// snapshot and reaches the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Send(String),
    Debug,
    Analyze,
    Convert(Language),
    AllInOne,
}

/// Returned when a trigger arrives while a request is already in flight.
/// Policy is reject, not queue: the new trigger is discarded and the prior
/// request stays in flight.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("a request is already in flight")]
pub struct BusyRejection;

/// Formatted assistant reply produced by a dispatch task. Appended to the
/// log only when the controller resolves, so completions cannot reorder.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reply {
    content: String,
    attachments: Vec<CodeAttachment>,
}

impl Reply {
    fn failure(message: &str) -> Self {
        Reply {
            content: format!("Error: {}", message),
            attachments: Vec::new(),
        }
    }
}

/// Coordinates editor triggers, backend calls, and chat accumulation.
///
/// Two states: Idle (no pending task) and Busy (exactly one). The busy flag
/// holds for the full lifetime of a dispatch; all mutation of the message
/// log goes through `trigger` and `resolve`, so appends preserve causal
/// order relative to the action that produced them.
pub struct Controller {
    log: MessageLog,
    dispatcher: Arc<dyn Dispatcher>,
    pending: Option<JoinHandle<Reply>>,
}

impl Controller {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            log: MessageLog::new(),
            dispatcher,
            pending: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        self.log.all()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// True when the in-flight task has finished and `resolve` will not
    /// block. Polled from the tick handler.
    pub fn poll_finished(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| h.is_finished())
    }

    /// Accept a trigger from Idle. Rejected while Busy; the log is left
    /// untouched until the in-flight outcome resolves.
    pub fn trigger(
        &mut self,
        trigger: Trigger,
        snapshot: EditorSnapshot,
    ) -> Result<(), BusyRejection> {
        if self.pending.is_some() {
            return Err(BusyRejection);
        }

        match trigger {
            Trigger::Send(text) => {
                // No chat endpoint on the backend; answer locally without
                // entering Busy.
                self.log.append(Sender::User, text, Vec::new());
                self.log.append(Sender::Assistant, SEND_ACK, Vec::new());
            }
            Trigger::Debug => {
                self.spawn_single(Action::Debug, snapshot, None);
            }
            Trigger::Analyze => {
                self.spawn_single(Action::Analyze, snapshot, None);
            }
            Trigger::Convert(target) => {
                self.spawn_single(Action::Convert, snapshot, Some(target));
            }
            Trigger::AllInOne => {
                self.log.append(Sender::User, ALL_IN_ONE_INTENT, Vec::new());
                self.spawn_all_in_one(snapshot);
            }
        }

        Ok(())
    }

    /// Await the pending task and append its assistant message, returning
    /// the controller to Idle. No-op when Idle.
    pub async fn resolve(&mut self) {
        let Some(handle) = self.pending.take() else {
            return;
        };
        let reply = match handle.await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!(%err, "dispatch task panicked");
                Reply::failure("analysis task failed")
            }
        };
        self.log
            .append(Sender::Assistant, reply.content, reply.attachments);
    }

    fn spawn_single(
        &mut self,
        action: Action,
        snapshot: EditorSnapshot,
        target: Option<Language>,
    ) {
        let dispatcher = Arc::clone(&self.dispatcher);
        let payload = RequestPayload {
            code: snapshot.code,
            source_lang: snapshot.language,
            target_lang: target,
        };
        let source = snapshot.language;
        self.pending = Some(tokio::spawn(async move {
            match dispatcher.send(action, payload).await {
                Outcome::Success(response) => match action {
                    Action::Debug => format_debug(&response, source),
                    Action::Analyze => format_analyze(&response),
                    Action::Convert => {
                        // Convert always carries a target; fall back to the
                        // source language if it somehow does not.
                        format_convert(&response, target.unwrap_or(source))
                    }
                },
                Outcome::Failure(message) => Reply::failure(&message),
            }
        }));
    }

    /// Composite action: debug, then analyze, sequentially. Both must
    /// succeed; a failed sub-request discards partial results and yields a
    /// single failure message.
    fn spawn_all_in_one(&mut self, snapshot: EditorSnapshot) {
        let dispatcher = Arc::clone(&self.dispatcher);
        let payload = RequestPayload {
            code: snapshot.code,
            source_lang: snapshot.language,
            target_lang: None,
        };
        let source = snapshot.language;
        self.pending = Some(tokio::spawn(async move {
            let debug = match dispatcher.send(Action::Debug, payload.clone()).await {
                Outcome::Success(response) => response,
                Outcome::Failure(message) => return Reply::failure(&message),
            };
            match dispatcher.send(Action::Analyze, payload).await {
                Outcome::Success(analyze) => format_all_in_one(&debug, &analyze, source),
                Outcome::Failure(message) => Reply::failure(&message),
            }
        }));
    }
}

fn attachment(language: Language, code: String) -> CodeAttachment {
    CodeAttachment {
        language: language.as_str().to_string(),
        code,
    }
}

fn format_debug(response: &ResponsePayload, source: Language) -> Reply {
    let summary = response.summary.as_deref().unwrap_or_default();
    let attachments = response
        .fixed_code
        .clone()
        .map(|code| vec![attachment(source, code)])
        .unwrap_or_default();
    Reply {
        content: format!("Debug Results:\n{}", summary),
        attachments,
    }
}

fn format_analyze(response: &ResponsePayload) -> Reply {
    let time = response.time_complexity.as_deref().unwrap_or_default();
    let space = response.space_complexity.as_deref().unwrap_or_default();
    let explanation = response.explanation.as_deref().unwrap_or_default();
    Reply {
        content: format!("Complexity Analysis:\n{}\n{}\n\n{}", time, space, explanation),
        attachments: Vec::new(),
    }
}

fn format_convert(response: &ResponsePayload, target: Language) -> Reply {
    let code = response
        .converted_code
        .clone()
        .unwrap_or_else(|| "Conversion failed".to_string());
    Reply {
        content: format!("Converted Code ({}):", target.as_str()),
        attachments: vec![attachment(target, code)],
    }
}

fn format_all_in_one(
    debug: &ResponsePayload,
    analyze: &ResponsePayload,
    source: Language,
) -> Reply {
    let summary = debug
        .summary
        .as_deref()
        .unwrap_or("No debug summary available");
    let time = analyze
        .time_complexity
        .as_deref()
        .unwrap_or("Time complexity: Unknown");
    let space = analyze
        .space_complexity
        .as_deref()
        .unwrap_or("Space complexity: Unknown");

    let mut content = String::from("# Comprehensive Code Analysis\n\n## Debug Results\n");
    content.push_str(summary);
    content.push_str("\n\n## Complexity Analysis\n");
    content.push_str(time);
    content.push('\n');
    content.push_str(space);
    if let Some(explanation) = analyze.explanation.as_deref() {
        content.push('\n');
        content.push_str(explanation);
    }

    let attachments = debug
        .fixed_code
        .clone()
        .map(|code| vec![attachment(source, code)])
        .unwrap_or_default();
    Reply {
        content,
        attachments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn snapshot(code: &str, language: Language) -> EditorSnapshot {
        EditorSnapshot {
            code: code.to_string(),
            language,
        }
    }

    fn success(json: serde_json::Value) -> Outcome {
        Outcome::Success(serde_json::from_value(json).unwrap())
    }

    /// Scripted stand-in for the HTTP client: pops pre-loaded outcomes and
    /// records the actions it saw.
    struct ScriptedDispatcher {
        outcomes: Mutex<VecDeque<Outcome>>,
        calls: Mutex<Vec<Action>>,
    }

    impl ScriptedDispatcher {
        fn new(outcomes: Vec<Outcome>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Action> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Dispatcher for ScriptedDispatcher {
        async fn send(&self, action: Action, _payload: RequestPayload) -> Outcome {
            self.calls.lock().unwrap().push(action);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Outcome::Failure("unscripted call".to_string()))
        }
    }

    /// Dispatcher that blocks until released, for exercising the Busy state.
    struct GatedDispatcher {
        gate: tokio::sync::Notify,
    }

    #[async_trait]
    impl Dispatcher for GatedDispatcher {
        async fn send(&self, _action: Action, _payload: RequestPayload) -> Outcome {
            self.gate.notified().await;
            success(serde_json::json!({"summary": "done"}))
        }
    }

    #[tokio::test]
    async fn test_debug_formats_summary_and_attachment() {
        let dispatcher = ScriptedDispatcher::new(vec![success(
            serde_json::json!({"summary": "ok", "fixed_code": "x=1"}),
        )]);
        let mut controller = Controller::new(dispatcher.clone());

        controller
            .trigger(Trigger::Debug, snapshot("x=2", Language::JavaScript))
            .unwrap();
        assert!(controller.is_busy());
        controller.resolve().await;

        assert!(!controller.is_busy());
        let messages = controller.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, Sender::Assistant);
        assert_eq!(messages[0].content, "Debug Results:\nok");
        assert_eq!(
            messages[0].attachments,
            vec![CodeAttachment {
                language: "javascript".to_string(),
                code: "x=1".to_string(),
            }]
        );
        assert_eq!(dispatcher.calls(), vec![Action::Debug]);
    }

    #[tokio::test]
    async fn test_analyze_defaults_missing_explanation() {
        let dispatcher = ScriptedDispatcher::new(vec![success(
            serde_json::json!({"time_complexity": "O(n)", "space_complexity": "O(1)"}),
        )]);
        let mut controller = Controller::new(dispatcher);

        controller
            .trigger(Trigger::Analyze, snapshot("x=1", Language::Python))
            .unwrap();
        controller.resolve().await;

        let messages = controller.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "Complexity Analysis:\nO(n)\nO(1)\n\n");
        assert!(messages[0].attachments.is_empty());
    }

    #[tokio::test]
    async fn test_convert_falls_back_when_code_missing() {
        let dispatcher = ScriptedDispatcher::new(vec![success(serde_json::json!({}))]);
        let mut controller = Controller::new(dispatcher);

        controller
            .trigger(
                Trigger::Convert(Language::Python),
                snapshot("x=1", Language::JavaScript),
            )
            .unwrap();
        controller.resolve().await;

        let messages = controller.messages();
        assert_eq!(messages[0].content, "Converted Code (python):");
        assert_eq!(messages[0].attachments.len(), 1);
        assert_eq!(messages[0].attachments[0].language, "python");
        assert_eq!(messages[0].attachments[0].code, "Conversion failed");
    }

    #[tokio::test]
    async fn test_all_in_one_composes_sections() {
        let dispatcher = ScriptedDispatcher::new(vec![
            success(serde_json::json!({"summary": "no bugs", "fixed_code": "x=1"})),
            success(serde_json::json!({
                "time_complexity": "O(n)",
                "space_complexity": "O(1)",
                "explanation": "linear scan"
            })),
        ]);
        let mut controller = Controller::new(dispatcher.clone());

        controller
            .trigger(Trigger::AllInOne, snapshot("x=1", Language::Go))
            .unwrap();
        // The user-facing intent message lands before the outcome arrives
        assert_eq!(controller.messages().len(), 1);
        assert_eq!(controller.messages()[0].sender, Sender::User);
        controller.resolve().await;

        let messages = controller.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].id < messages[1].id);
        assert_eq!(
            messages[1].content,
            "# Comprehensive Code Analysis\n\n## Debug Results\nno bugs\n\n\
             ## Complexity Analysis\nO(n)\nO(1)\nlinear scan"
        );
        assert_eq!(messages[1].attachments[0].code, "x=1");
        assert_eq!(dispatcher.calls(), vec![Action::Debug, Action::Analyze]);
    }

    #[tokio::test]
    async fn test_all_in_one_uses_fallback_literals() {
        let dispatcher = ScriptedDispatcher::new(vec![
            success(serde_json::json!({})),
            success(serde_json::json!({})),
        ]);
        let mut controller = Controller::new(dispatcher);

        controller
            .trigger(Trigger::AllInOne, snapshot("x=1", Language::Go))
            .unwrap();
        controller.resolve().await;

        let messages = controller.messages();
        assert_eq!(
            messages[1].content,
            "# Comprehensive Code Analysis\n\n## Debug Results\n\
             No debug summary available\n\n## Complexity Analysis\n\
             Time complexity: Unknown\nSpace complexity: Unknown"
        );
        assert!(messages[1].attachments.is_empty());
    }

    #[tokio::test]
    async fn test_all_in_one_failure_discards_partial_results() {
        let dispatcher = ScriptedDispatcher::new(vec![
            Outcome::Failure("backend returned 500".to_string()),
            success(serde_json::json!({"time_complexity": "O(n)"})),
        ]);
        let mut controller = Controller::new(dispatcher);

        controller
            .trigger(Trigger::AllInOne, snapshot("x=1", Language::Rust))
            .unwrap();
        controller.resolve().await;

        let messages = controller.messages();
        // Intent message plus exactly one failure message, no partial render
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "Error: backend returned 500");
        assert!(messages[1].attachments.is_empty());
    }

    #[tokio::test]
    async fn test_all_in_one_discards_debug_result_when_analyze_fails() {
        let dispatcher = ScriptedDispatcher::new(vec![
            success(serde_json::json!({"summary": "no bugs", "fixed_code": "x=1"})),
            Outcome::Failure("backend returned 500".to_string()),
        ]);
        let mut controller = Controller::new(dispatcher.clone());

        controller
            .trigger(Trigger::AllInOne, snapshot("x=1", Language::Rust))
            .unwrap();
        controller.resolve().await;

        let messages = controller.messages();
        // The fetched debug summary and fixed code must not leak through
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "Error: backend returned 500");
        assert!(messages[1].attachments.is_empty());
        assert_eq!(dispatcher.calls(), vec![Action::Debug, Action::Analyze]);
    }

    #[tokio::test]
    async fn test_failure_surfaces_as_error_message() {
        let dispatcher =
            ScriptedDispatcher::new(vec![Outcome::Failure("network error: refused".to_string())]);
        let mut controller = Controller::new(dispatcher);

        controller
            .trigger(Trigger::Debug, snapshot("x=1", Language::Cpp))
            .unwrap();
        controller.resolve().await;

        let messages = controller.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, Sender::Assistant);
        assert_eq!(messages[0].content, "Error: network error: refused");
    }

    #[tokio::test]
    async fn test_busy_trigger_is_rejected_without_touching_log() {
        let dispatcher = Arc::new(GatedDispatcher {
            gate: tokio::sync::Notify::new(),
        });
        let mut controller = Controller::new(dispatcher.clone());

        controller
            .trigger(Trigger::Debug, snapshot("x=1", Language::Java))
            .unwrap();
        assert!(controller.is_busy());

        let rejected = controller.trigger(Trigger::Analyze, snapshot("x=2", Language::Java));
        assert_eq!(rejected, Err(BusyRejection));
        assert!(controller.messages().is_empty());

        dispatcher.gate.notify_one();
        controller.resolve().await;
        assert_eq!(controller.messages().len(), 1);
        assert_eq!(controller.messages()[0].content, "Debug Results:\ndone");
    }

    #[tokio::test]
    async fn test_repeated_triggers_are_idempotent_modulo_ids() {
        let response = serde_json::json!({"summary": "ok", "fixed_code": "x=1"});
        let dispatcher = ScriptedDispatcher::new(vec![
            success(response.clone()),
            success(response),
        ]);
        let mut controller = Controller::new(dispatcher);

        for _ in 0..2 {
            controller
                .trigger(Trigger::Debug, snapshot("x=2", Language::JavaScript))
                .unwrap();
            controller.resolve().await;
        }

        let messages = controller.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, messages[1].content);
        assert_eq!(messages[0].attachments, messages[1].attachments);
        assert_ne!(messages[0].id, messages[1].id);
    }

    #[tokio::test]
    async fn test_send_is_answered_locally() {
        let dispatcher = ScriptedDispatcher::new(Vec::new());
        let mut controller = Controller::new(dispatcher.clone());

        controller
            .trigger(
                Trigger::Send("what does this do?".to_string()),
                snapshot("x=1", Language::Php),
            )
            .unwrap();

        assert!(!controller.is_busy());
        let messages = controller.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].content, "what does this do?");
        assert_eq!(messages[1].sender, Sender::Assistant);
        assert!(dispatcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_when_idle_is_a_no_op() {
        let dispatcher = ScriptedDispatcher::new(Vec::new());
        let mut controller = Controller::new(dispatcher);
        controller.resolve().await;
        assert!(controller.messages().is_empty());
    }
}
