//! Integration tests for the chat session.
//! The live test at the bottom needs GEMINI_API_KEY in the environment.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use tokio::sync::oneshot;
    use tokio_test::{assert_pending, assert_ready};

    use bestbro::chat::{
        ChatConfig, ChatSession, MISSING_KEY_MESSAGE, RequestState, WELCOME_MESSAGE,
    };
    use bestbro::{
        API_KEY_CREDENTIAL, CompletionConnector, CompletionService, Content, CredentialStore,
        Error, FileCredentialStore, GeminiConnector, MemoryCredentialStore, Message, Model,
        Reply, Result,
    };

    /// Answers every call with a clone of the same result.
    struct Canned {
        result: Result<Reply>,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl CompletionService for Canned {
        async fn generate(&self, _: &Model, _: &[Content]) -> Result<Reply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    /// Holds each call open until the test releases it.
    struct Gated {
        gate: Mutex<Option<oneshot::Receiver<Result<Reply>>>>,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl CompletionService for Gated {
        async fn generate(&self, _: &Model, _: &[Content]) -> Result<Reply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.gate.lock().unwrap().take();
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(Error::unknown("gate dropped"))),
                None => Err(Error::unknown("gate already used")),
            }
        }
    }

    struct Connector(Arc<dyn CompletionService>);

    impl CompletionConnector for Connector {
        fn connect(&self, _: &str) -> Result<Arc<dyn CompletionService>> {
            Ok(self.0.clone())
        }
    }

    fn canned(result: Result<Reply>) -> Arc<Canned> {
        Arc::new(Canned {
            result,
            calls: AtomicUsize::new(0),
        })
    }

    fn session(
        service: Arc<dyn CompletionService>,
        config: ChatConfig,
        store: Arc<dyn CredentialStore>,
    ) -> ChatSession {
        ChatSession::new(config, store, Arc::new(Connector(service))).unwrap()
    }

    fn keyed(service: Arc<dyn CompletionService>) -> ChatSession {
        session(
            service,
            ChatConfig::new().with_api_key("test-key"),
            Arc::new(MemoryCredentialStore::new()),
        )
    }

    #[test]
    fn starts_with_welcome_for_any_starter() {
        for starter in ["", "hey", "嗨！幫我測試一下台北旅遊的一日行程～"] {
            let session = session(
                canned(Ok(Reply::empty())),
                ChatConfig::new().with_starter(starter),
                Arc::new(MemoryCredentialStore::new()),
            );
            assert_eq!(session.transcript(), &[Message::model(WELCOME_MESSAGE)]);
            assert_eq!(session.composer(), starter);
        }
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let service = canned(Ok(Reply::text("never")));
        let mut session = keyed(service.clone());
        session.set_composer("   \n\t");
        assert!(!session.send_message(None).await);
        assert!(!session.send_message(Some("  ")).await);
        assert_eq!(session.message_count(), 1);
        assert!(session.error().is_none());
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blank_input_keeps_previous_error() {
        let mut session = keyed(canned(Err(Error::unknown("boom"))));
        session.send_message(Some("hi")).await;
        assert!(!session.send_message(Some("")).await);
        assert_eq!(session.error(), Some("boom"));
    }

    #[tokio::test]
    async fn sends_while_pending_are_dropped() {
        let (tx, rx) = oneshot::channel();
        let service = Arc::new(Gated {
            gate: Mutex::new(Some(rx)),
            calls: AtomicUsize::new(0),
        });
        let mut session = keyed(service.clone());

        let turn = session.begin_send(Some("first")).unwrap();
        assert_eq!(session.state(), RequestState::Pending);
        assert_eq!(turn.contents().len(), 2);

        let mut request = tokio_test::task::spawn(turn.execute());
        assert_pending!(request.poll());
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);

        assert!(session.begin_send(Some("second")).is_none());
        assert!(!session.send_message(Some("third")).await);
        assert_eq!(session.message_count(), 2);
        assert!(session.error().is_none());
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);

        tx.send(Ok(Reply::text("done"))).unwrap();
        let outcome = assert_ready!(request.poll());
        session.finish_send(outcome);

        assert_eq!(session.state(), RequestState::Idle);
        assert_eq!(
            session.transcript(),
            &[
                Message::model(WELCOME_MESSAGE),
                Message::user("first"),
                Message::model("done"),
            ]
        );
    }

    #[tokio::test]
    async fn missing_key_is_reported() {
        let service = canned(Ok(Reply::text("never")));
        let mut session = session(
            service.clone(),
            ChatConfig::new(),
            Arc::new(MemoryCredentialStore::new()),
        );
        session.set_composer("hi");
        assert!(!session.send_message(None).await);
        assert_eq!(session.error(), Some(MISSING_KEY_MESSAGE));
        assert!(!session.error().unwrap_or_default().is_empty());
        assert_eq!(session.message_count(), 1);
        assert_eq!(session.composer(), "hi");
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_send() {
        let mut session = keyed(canned(Ok(Reply::text("hello"))));
        session.set_composer("hi");
        assert!(session.send_message(None).await);
        assert_eq!(
            session.transcript(),
            &[
                Message::model(WELCOME_MESSAGE),
                Message::user("hi"),
                Message::model("hello"),
            ]
        );
        assert!(session.error().is_none());
        assert_eq!(session.state(), RequestState::Idle);
        assert_eq!(session.composer(), "");
    }

    #[tokio::test]
    async fn empty_reply_gets_placeholder() {
        let mut session = keyed(canned(Ok(Reply::empty())));
        session.send_message(Some("hi")).await;
        assert_eq!(session.transcript()[2], Message::model("[No content]"));
    }

    #[tokio::test]
    async fn failed_send_keeps_user_message() {
        let mut session = keyed(canned(Err(Error::unknown("boom"))));
        session.set_composer("hi");
        assert!(session.send_message(None).await);
        assert_eq!(
            session.transcript(),
            &[Message::model(WELCOME_MESSAGE), Message::user("hi")]
        );
        assert_eq!(session.error(), Some("boom"));
        assert_eq!(session.state(), RequestState::Idle);
        assert_eq!(session.composer(), "");
    }

    #[test]
    fn remember_toggle_round_trip() {
        let store = Arc::new(MemoryCredentialStore::new());
        let mut session = session(
            canned(Ok(Reply::empty())),
            ChatConfig::new(),
            store.clone(),
        );
        session.set_api_key("secret").unwrap();
        assert_eq!(
            store.get(API_KEY_CREDENTIAL).unwrap().as_deref(),
            Some("secret")
        );

        session.set_remember_key(false).unwrap();
        assert_eq!(store.get(API_KEY_CREDENTIAL).unwrap(), None);
        assert_eq!(session.api_key(), "secret");

        session.set_remember_key(true).unwrap();
        assert_eq!(
            store.get(API_KEY_CREDENTIAL).unwrap().as_deref(),
            Some("secret")
        );
        assert_eq!(session.api_key(), "secret");
    }

    /// Reads nothing and refuses every write.
    struct ReadOnlyStore;

    impl CredentialStore for ReadOnlyStore {
        fn get(&self, _: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&self, _: &str, _: &str) -> Result<()> {
            Err(Error::permission("store is read-only"))
        }

        fn remove(&self, _: &str) -> Result<()> {
            Err(Error::permission("store is read-only"))
        }
    }

    #[tokio::test]
    async fn store_failures_surface_after_state_changes() {
        let service = canned(Ok(Reply::text("still works")));
        let mut session = session(service.clone(), ChatConfig::new(), Arc::new(ReadOnlyStore));
        assert!(!session.can_send());

        let err = session.set_api_key("fresh").unwrap_err();
        assert_eq!(err.message(), "store is read-only");
        assert_eq!(session.api_key(), "fresh");
        assert!(session.can_send());

        let err = session.set_remember_key(false).unwrap_err();
        assert!(matches!(err, Error::Permission { .. }));
        assert!(!session.remember_key());

        let err = session.set_remember_key(true).unwrap_err();
        assert_eq!(err.message(), "store is read-only");
        assert!(session.remember_key());

        assert!(session.send_message(Some("hi")).await);
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.transcript()[2], Message::model("still works"));
    }

    #[test]
    fn unremembered_session_clears_stored_key() {
        let store = Arc::new(MemoryCredentialStore::with_value(API_KEY_CREDENTIAL, "old"));
        let mut session = session(
            canned(Ok(Reply::empty())),
            ChatConfig::new().with_remember_key(false),
            store.clone(),
        );
        assert_eq!(store.get(API_KEY_CREDENTIAL).unwrap(), None);

        session.set_api_key("new").unwrap();
        assert_eq!(session.api_key(), "new");
        assert_eq!(store.get(API_KEY_CREDENTIAL).unwrap(), None);
    }

    #[test]
    fn remembered_key_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let mut first = session(
            canned(Ok(Reply::empty())),
            ChatConfig::new(),
            Arc::new(FileCredentialStore::new(&path)),
        );
        first.set_api_key("persisted").unwrap();
        drop(first);

        let second = session(
            canned(Ok(Reply::empty())),
            ChatConfig::new(),
            Arc::new(FileCredentialStore::new(&path)),
        );
        assert_eq!(second.api_key(), "persisted");
        assert!(second.can_send());
    }

    #[tokio::test]
    async fn live_gemini_round_trip() {
        let Ok(api_key) = std::env::var("GEMINI_API_KEY") else {
            eprintln!("Skipping test: GEMINI_API_KEY not set");
            return;
        };

        let mut session = ChatSession::new(
            ChatConfig::new()
                .with_api_key(api_key)
                .with_remember_key(false),
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(GeminiConnector::new()),
        )
        .unwrap();
        assert!(session.send_message(Some("Reply with the word ok.")).await);
        assert!(session.error().is_none(), "{:?}", session.error());
        assert_eq!(session.message_count(), 3);
    }
}
