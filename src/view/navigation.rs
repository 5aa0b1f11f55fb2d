use reqwest::Url;
use tokio::sync::mpsc;
use tracing::info;

const TALK_ROOM_PATH: &str = "/talk_room";
const THANK_YOU_PATH: &str = "/thank-you";

/// Views the client can navigate to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    /// Interview room, carrying the participant identity as query parameters
    TalkRoom { name: String, email: String },
    /// Terminal acknowledgment view
    ThankYou,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::TalkRoom { .. } => TALK_ROOM_PATH,
            Route::ThankYou => THANK_YOU_PATH,
        }
    }

    /// Absolute URL of this route under `origin`
    pub fn url(&self, origin: &Url) -> Url {
        let mut url = origin.clone();
        url.set_path(self.path());
        url.set_query(None);

        if let Route::TalkRoom { name, email } = self {
            url.query_pairs_mut()
                .append_pair("name", name)
                .append_pair("email", email);
        }
        url
    }

    /// Resolve a URL to a route
    ///
    /// A talk-room URL without both `name` and `email` redirects home.
    pub fn from_url(url: &Url) -> Route {
        match url.path() {
            TALK_ROOM_PATH => {
                let param = |key: &str| {
                    url.query_pairs()
                        .find(|(k, v)| k == key && !v.is_empty())
                        .map(|(_, v)| v.into_owned())
                };
                match (param("name"), param("email")) {
                    (Some(name), Some(email)) => Route::TalkRoom { name, email },
                    _ => Route::Home,
                }
            }
            THANK_YOU_PATH => Route::ThankYou,
            _ => Route::Home,
        }
    }
}

/// Navigation surface of the hosting UI
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator that forwards routes to a channel
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<Route>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Route>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, route: Route) {
        info!("Navigating to {}", route.path());
        // Receiver gone means the UI has shut down
        let _ = self.tx.send(route);
    }
}
