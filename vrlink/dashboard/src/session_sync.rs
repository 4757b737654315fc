use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use serde_json as json;
use vrlink_common::{anyhow::Result, debug, warn};
use vrlink_session::{Path, SessionDesc};

const CLIENT_ID_LEN: usize = 10;

/// Tells the server which side effects a stored document needs.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    Settings,
    ClientList,
    Other,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreRequest {
    pub change_kind: ChangeKind,
    pub client_id: String,
    pub document: SessionDesc,
}

pub trait SessionBackend {
    fn store(&mut self, request: StoreRequest);
    fn fetch(&mut self);
}

pub fn random_client_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CLIENT_ID_LEN)
        .map(char::from)
        .collect()
}

/// Local copy of the session document, kept in sync with the server.
pub struct SessionSync {
    session: SessionDesc,
    client_id: String,
    applying: bool,
    backend: Box<dyn SessionBackend>,
}

impl SessionSync {
    pub fn new(session: SessionDesc, backend: Box<dyn SessionBackend>) -> Self {
        Self {
            session,
            client_id: random_client_id(),
            applying: false,
            backend,
        }
    }

    pub fn session(&self) -> &SessionDesc {
        &self.session
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn is_applying(&self) -> bool {
        self.applying
    }

    pub fn set_param(&mut self, path: &Path, value: json::Value) -> Result<()> {
        self.session.set_setting(path, value)
    }

    pub fn set_variant(&mut self, radio_path: &Path) -> Result<()> {
        self.session.set_variant(radio_path)
    }

    /// Push the whole document. Returns false if nothing was sent.
    pub fn commit(&mut self, change_kind: ChangeKind) -> bool {
        if self.applying {
            return false;
        }

        debug!("Storing session ({change_kind:?})");
        self.backend.store(StoreRequest {
            change_kind,
            client_id: self.client_id.clone(),
            document: self.session.clone(),
        });

        true
    }

    /// Swap in a new document. `apply` runs with the applying flag set, so it can go through the
    /// regular change handlers without pushing anything back.
    pub fn replace(&mut self, session: SessionDesc, apply: impl FnOnce(&mut Self)) {
        self.applying = true;
        self.session = session;
        apply(self);
        self.applying = false;
    }

    /// Handle a non-empty store response. The server wins: a body holding a document is
    /// returned so the caller can apply it, anything else triggers a fresh load.
    pub fn store_failed(&mut self, body: &str) -> Option<SessionDesc> {
        match json::from_str::<SessionDesc>(body) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("Session store failed, reloading session: {e}");
                self.backend.fetch();

                None
            }
        }
    }

    pub fn refetch(&mut self) {
        self.backend.fetch();
    }

    pub fn disable_setup_wizard(&mut self) -> bool {
        self.session.setup_wizard = false;

        self.commit(ChangeKind::Other)
    }

    pub fn session_mut(&mut self) -> &mut SessionDesc {
        &mut self.session
    }
}

#[cfg(test)]
pub mod test_backend {
    use super::*;
    use std::{cell::RefCell, rc::Rc};

    #[derive(Default)]
    pub struct Recorded {
        pub stores: Vec<StoreRequest>,
        pub fetches: usize,
    }

    #[derive(Clone, Default)]
    pub struct RecordingBackend(pub Rc<RefCell<Recorded>>);

    impl SessionBackend for RecordingBackend {
        fn store(&mut self, request: StoreRequest) {
            self.0.borrow_mut().stores.push(request);
        }

        fn fetch(&mut self) {
            self.0.borrow_mut().fetches += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{test_backend::RecordingBackend, *};
    use vrlink_session::parse_path;

    fn sync_with_recorder() -> (SessionSync, RecordingBackend) {
        let backend = RecordingBackend::default();
        let session = SessionDesc {
            session_settings: json::json!({ "video": { "bitrate": 30 } }),
            ..Default::default()
        };

        (
            SessionSync::new(session, Box::new(backend.clone())),
            backend,
        )
    }

    #[test]
    fn client_id_is_alphanumeric() {
        let id = random_client_id();

        assert_eq!(id.len(), CLIENT_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn commit_sends_whole_document() {
        let (mut sync, backend) = sync_with_recorder();

        sync.set_param(&parse_path("video.bitrate"), json::json!(45))
            .unwrap();
        assert!(sync.commit(ChangeKind::Settings));

        let recorded = backend.0.borrow();
        assert_eq!(recorded.stores.len(), 1);

        let request = json::to_value(&recorded.stores[0]).unwrap();
        assert_eq!(request["changeKind"], json::json!("settings"));
        assert_eq!(request["clientId"], json::json!(sync.client_id()));
        assert_eq!(
            request["document"]["sessionSettings"],
            json::json!({ "video": { "bitrate": 45 } })
        );
    }

    #[test]
    fn no_commit_while_applying() {
        let (mut sync, backend) = sync_with_recorder();

        let mut committed = true;
        sync.replace(SessionDesc::default(), |sync| {
            committed = sync.commit(ChangeKind::Settings);
        });

        assert!(!committed);
        assert!(!sync.is_applying());
        assert!(backend.0.borrow().stores.is_empty());
    }

    #[test]
    fn store_failure_prefers_server_document() {
        let (mut sync, backend) = sync_with_recorder();

        let server_session = SessionDesc {
            locale: "it".into(),
            ..Default::default()
        };
        let body = json::to_string(&server_session).unwrap();
        assert_eq!(sync.store_failed(&body), Some(server_session));
        assert_eq!(backend.0.borrow().fetches, 0);

        assert_eq!(sync.store_failed("Internal error"), None);
        assert_eq!(backend.0.borrow().fetches, 1);
    }

    #[test]
    fn disable_wizard_commits_other() {
        let (mut sync, backend) = sync_with_recorder();

        assert!(sync.disable_setup_wizard());

        let recorded = backend.0.borrow();
        assert_eq!(recorded.stores[0].change_kind, ChangeKind::Other);
        assert!(!recorded.stores[0].document.setup_wizard);
    }
}
