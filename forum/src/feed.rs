//! Keeps the displayed post list in step with the search box and the
//! category filter.
//!
//! Every fetch carries a [`Ticket`] holding the query it was issued for. Only
//! the latest ticket is authoritative, and its response is applied only if
//! it still answers the current query. Anything else that comes back is
//! dropped.

use std::{fmt, future::Future, sync::Arc, time::Duration};

use log::{debug, error, info};
use tokio::sync::mpsc;

use crate::api::ForumApi;
use crate::models::{Category, Post, QueryState, SearchMode};
use crate::timer::DebounceTimer;

/// Quiet period after the last keystroke before a search is sent.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No session yet.
    Idle,
    LoadingFeed,
    DebouncePending,
    LoadingSearch,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Feed,
    Search,
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchKind::Feed => write!(f, "feed"),
            FetchKind::Search => write!(f, "search"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub id: u64,
    pub kind: FetchKind,
    pub query: QueryState,
}

impl Ticket {
    /// Whether this request's response is what `query` should display. A
    /// feed answers any query in the same category that is not searching.
    pub fn answers(&self, query: &QueryState) -> bool {
        if self.query.category != query.category {
            return false;
        }
        match self.kind {
            FetchKind::Feed => query.search_mode() != SearchMode::Active,
            FetchKind::Search => self.query.search_term() == query.search_term(),
        }
    }
}

/// Result of handling one completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    SearchIssued,
    Applied(FetchKind),
    Failed(FetchKind),
    /// Response to a query that is no longer current.
    Discarded(FetchKind),
    /// Timer that was replaced or cancelled after it fired.
    Ignored,
}

enum Completion {
    DebounceElapsed(u64),
    Fetched {
        ticket: Ticket,
        result: anyhow::Result<Vec<Post>>,
    },
}

pub struct FeedController {
    api: Arc<dyn ForumApi>,
    query: QueryState,
    posts: Vec<Post>,
    phase: Phase,
    is_searching: bool,
    last_error: Option<String>,
    debounce: DebounceTimer,
    authoritative: Option<Ticket>,
    next_ticket: u64,
    in_flight: usize,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl FeedController {
    pub fn new(api: Arc<dyn ForumApi>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            query: QueryState::default(),
            posts: Vec::new(),
            phase: Phase::Idle,
            is_searching: false,
            last_error: None,
            debounce: DebounceTimer::new(),
            authoritative: None,
            next_ticket: 0,
            in_flight: 0,
            tx,
            rx,
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn loading(&self) -> bool {
        matches!(
            self.phase,
            Phase::LoadingFeed | Phase::DebouncePending | Phase::LoadingSearch
        )
    }

    pub fn is_searching(&self) -> bool {
        self.is_searching
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// A timer is waiting or a fetch has not come back yet.
    pub fn has_pending(&self) -> bool {
        self.phase == Phase::DebouncePending || self.in_flight > 0
    }

    /// Starts from whatever query was entered before the session: an active
    /// search is debounced as if just typed, anything else loads the feed.
    pub fn on_session_established(&mut self) {
        info!("session established for {}", self.query);
        self.reevaluate(true);
    }

    pub fn on_session_ended(&mut self) {
        info!("session ended");
        self.debounce.cancel();
        self.authoritative = None;
        self.posts.clear();
        self.is_searching = false;
        self.last_error = None;
        self.phase = Phase::Idle;
    }

    pub fn on_search_text_changed(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text == self.query.search_text {
            return;
        }
        self.query.search_text = text;

        if self.phase != Phase::Idle {
            self.reevaluate(false);
        }
    }

    pub fn on_category_changed(&mut self, category: Category) {
        if category == self.query.category {
            return;
        }
        self.query.category = category;

        if self.phase != Phase::Idle {
            self.reevaluate(true);
        }
    }

    pub fn on_post_created(&mut self, post: Post) {
        self.posts.insert(0, post);
    }

    /// Waits for the next timer or fetch completion and applies it. Returns
    /// `None` straight away when nothing is outstanding.
    pub async fn process_next(&mut self) -> Option<Update> {
        if !self.has_pending() {
            return None;
        }
        let completion = self.rx.recv().await?;
        Some(self.apply(completion))
    }

    /// Applies completions that already arrived, without waiting.
    pub fn process_pending(&mut self) -> Vec<Update> {
        let mut updates = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            updates.push(self.apply(completion));
        }
        updates
    }

    pub async fn run_until_idle(&mut self) -> Vec<Update> {
        let mut updates = Vec::new();
        while let Some(update) = self.process_next().await {
            updates.push(update);
        }
        updates
    }

    fn reevaluate(&mut self, category_changed: bool) {
        match self.query.search_mode() {
            SearchMode::Active => self.arm_search(),
            SearchMode::Cleared => self.fetch_feed(),
            SearchMode::BelowMinimum if category_changed => self.fetch_feed(),
            SearchMode::BelowMinimum => self.hold(),
        }
    }

    fn fetch_feed(&mut self) {
        self.debounce.cancel();
        self.is_searching = false;
        self.phase = Phase::LoadingFeed;

        let ticket = self.issue(FetchKind::Feed);
        let api = Arc::clone(&self.api);
        let category = self.query.category.clone();
        self.spawn_fetch(ticket, async move { api.list_posts(&category).await });
    }

    fn arm_search(&mut self) {
        // The old list must not show while the new search is pending.
        self.posts.clear();
        self.authoritative = None;
        self.is_searching = true;
        self.phase = Phase::DebouncePending;

        let tx = self.tx.clone();
        let generation = self.debounce.arm(SEARCH_DEBOUNCE, move |generation| async move {
            let _ = tx.send(Completion::DebounceElapsed(generation));
        });
        debug!("search debounce #{} armed for {}", generation, self.query);
    }

    /// Too few characters to search: nothing is sent and no pending search
    /// may fire for this query. The list on screen stays.
    fn hold(&mut self) {
        self.debounce.cancel();
        if self
            .authoritative
            .as_ref()
            .is_some_and(|ticket| ticket.answers(&self.query))
        {
            return;
        }
        if self.loading() {
            debug!("dropping pending search, {} is below minimum", self.query);
        }
        self.settle();
    }

    fn issue(&mut self, kind: FetchKind) -> Ticket {
        self.next_ticket += 1;
        let ticket = Ticket {
            id: self.next_ticket,
            kind,
            query: self.query.clone(),
        };
        debug!("issuing {} request #{} for {}", kind, ticket.id, ticket.query);
        self.authoritative = Some(ticket.clone());
        ticket
    }

    fn spawn_fetch<F>(&mut self, ticket: Ticket, fetch: F)
    where
        F: Future<Output = anyhow::Result<Vec<Post>>> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = fetch.await;
            let _ = tx.send(Completion::Fetched { ticket, result });
        });
    }

    fn is_latest(&self, ticket: &Ticket) -> bool {
        self.authoritative
            .as_ref()
            .is_some_and(|current| current.id == ticket.id)
    }

    fn is_authoritative(&self, ticket: &Ticket) -> bool {
        self.is_latest(ticket) && ticket.answers(&self.query)
    }

    fn settle(&mut self) {
        self.authoritative = None;
        self.is_searching = false;
        self.phase = Phase::Ready;
    }

    fn apply(&mut self, completion: Completion) -> Update {
        match completion {
            Completion::DebounceElapsed(generation) => {
                if self.phase != Phase::DebouncePending || !self.debounce.is_current(generation)
                {
                    debug!("ignoring superseded debounce #{}", generation);
                    return Update::Ignored;
                }
                self.debounce.cancel();
                self.phase = Phase::LoadingSearch;

                let ticket = self.issue(FetchKind::Search);
                let api = Arc::clone(&self.api);
                let term = self.query.search_term().to_string();
                let category = self.query.category.clone();
                self.spawn_fetch(ticket, async move {
                    api.search_posts(&term, &category).await
                });
                Update::SearchIssued
            }
            Completion::Fetched { ticket, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);

                if !self.is_authoritative(&ticket) {
                    debug!(
                        "discarding stale {} response #{} for {}",
                        ticket.kind, ticket.id, ticket.query
                    );
                    if self.is_latest(&ticket) {
                        // Nothing newer is coming for this request.
                        self.settle();
                    }
                    return Update::Discarded(ticket.kind);
                }

                self.authoritative = None;
                self.phase = Phase::Ready;
                if ticket.kind == FetchKind::Search {
                    self.is_searching = false;
                }

                match result {
                    Ok(posts) => {
                        debug!("{} #{} returned {} posts", ticket.kind, ticket.id, posts.len());
                        self.posts = posts;
                        self.last_error = None;
                        Update::Applied(ticket.kind)
                    }
                    Err(e) => {
                        error!("failed to load {} for {}: {:#}", ticket.kind, ticket.query, e);
                        self.last_error = Some(format!("{:#}", e));
                        Update::Failed(ticket.kind)
                    }
                }
            }
        }
    }
}
