//! The conversation state machine.

use std::sync::Arc;

use angel_engine::{parse_restrictions, AssignmentEngine, RestrictionSet};
use database::validation::{sanitize_name, sanitize_wishlist};
use database::{assignment, participant, Database, RosterEntry, UpsertOutcome};
use tracing::{debug, error, info, warn};

use crate::error::ConversationError;
use crate::event::{Command, InboundEvent};
use crate::messages;
use crate::rate_limit::{Admission, RateLimit, RateLimiter};
use crate::sender::MessageSender;
use crate::state::{ConversationState, ConversationStore};

/// Handler settings.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// Caller id of the organizer. Empty or `0` means nobody is admin.
    pub admin_id: String,
    /// Per-caller admission limit.
    pub rate_limit: RateLimit,
}

impl HandlerConfig {
    pub fn new(admin_id: impl Into<String>) -> Self {
        Self {
            admin_id: admin_id.into(),
            rate_limit: RateLimit::default(),
        }
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Whether `caller_id` is the configured admin.
    pub fn is_admin(&self, caller_id: &str) -> bool {
        !self.admin_id.is_empty() && self.admin_id != "0" && caller_id == self.admin_id
    }
}

/// Drives registration, assignment lookup and the admin flows.
///
/// Events of one conversation must not be handled concurrently; the
/// [`Dispatcher`](crate::Dispatcher) takes care of that.
pub struct ConversationHandler {
    db: Database,
    engine: AssignmentEngine,
    sender: Arc<dyn MessageSender>,
    config: HandlerConfig,
    states: ConversationStore,
    limiter: RateLimiter,
}

impl ConversationHandler {
    pub fn new(
        db: Database,
        engine: AssignmentEngine,
        sender: Arc<dyn MessageSender>,
        config: HandlerConfig,
    ) -> Self {
        let limiter = RateLimiter::new(config.rate_limit);
        Self::with_stores(db, engine, sender, config, ConversationStore::new(), limiter)
    }

    /// Build a handler around existing flow state and limiter instances.
    ///
    /// `limiter` takes precedence over `config.rate_limit`.
    pub fn with_stores(
        db: Database,
        engine: AssignmentEngine,
        sender: Arc<dyn MessageSender>,
        config: HandlerConfig,
        states: ConversationStore,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            db,
            engine,
            sender,
            config,
            states,
            limiter,
        }
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Active flow states.
    pub fn states(&self) -> &ConversationStore {
        &self.states
    }

    /// Handle one inbound event to completion.
    ///
    /// Store failures are logged and answered with a generic notice; only
    /// failures to send replies are returned.
    pub async fn handle(&self, event: &InboundEvent) -> Result<(), ConversationError> {
        let command = Command::parse(&event.text);

        // Group chatter outside a flow is not addressed to the bot.
        if event.is_group
            && command.is_none()
            && self.states.get(&event.conversation_id).await.is_none()
        {
            return Ok(());
        }

        if let Admission::Limited { notify } = self.limiter.check(&event.caller_id).await {
            warn!("Rate limit exceeded for {}", event.caller_id);
            if notify {
                return self.reply(event, messages::RATE_LIMITED).await;
            }
            return Ok(());
        }

        let result = match command {
            Some(command) => self.handle_command(event, command).await,
            None => self.handle_text(event).await,
        };

        match result {
            Err(ConversationError::Database(e)) => {
                error!(
                    "Store failure in conversation {}: {}",
                    event.conversation_id, e
                );
                self.reply(event, messages::GENERIC_FAILURE).await
            }
            other => other,
        }
    }

    async fn reply(&self, event: &InboundEvent, text: &str) -> Result<(), ConversationError> {
        self.sender
            .send_message(&event.conversation_id, text, event.is_group)
            .await
    }

    async fn handle_command(
        &self,
        event: &InboundEvent,
        command: Command,
    ) -> Result<(), ConversationError> {
        let is_admin = self.config.is_admin(&event.caller_id);
        if command.is_admin_only() && !is_admin {
            warn!(
                "Non-admin {} tried {:?}",
                event.caller_id, command
            );
            return self.reply(event, messages::ADMIN_ONLY).await;
        }

        let previous = self.states.clear(&event.conversation_id).await;
        if let Some(ref state) = previous {
            debug!(
                "Discarding {} for {} on {:?}",
                state.name(),
                event.conversation_id,
                command
            );
        }

        match command {
            Command::Start => self.reply(event, messages::WELCOME).await,
            Command::Help => self.reply(event, &messages::help(is_admin)).await,
            Command::Register => {
                self.states
                    .set(&event.conversation_id, ConversationState::AwaitingName)
                    .await;
                self.reply(event, messages::ASK_NAME).await
            }
            Command::MyAssignment => {
                self.states
                    .set(
                        &event.conversation_id,
                        ConversationState::AwaitingNameForAssignment,
                    )
                    .await;
                self.reply(event, messages::ASK_NAME_FOR_ASSIGNMENT).await
            }
            Command::Participants => {
                let list = participant::list_participants(self.db.pool()).await?;
                self.reply(event, &messages::participants(&list)).await
            }
            Command::CreateGroups => {
                let roster = participant::roster(self.db.pool()).await?;
                if roster.len() < 2 {
                    return self.reply(event, messages::NOT_ENOUGH_PARTICIPANTS).await;
                }
                let count = roster.len();
                self.states
                    .set(
                        &event.conversation_id,
                        ConversationState::AwaitingNumGroups { roster },
                    )
                    .await;
                self.reply(event, &messages::ask_group_count(count)).await
            }
            Command::ClearData => {
                self.states
                    .set(
                        &event.conversation_id,
                        ConversationState::AwaitingClearConfirmation,
                    )
                    .await;
                self.reply(event, messages::CONFIRM_CLEAR).await
            }
            Command::Cancel => {
                let text = if previous.is_some() {
                    messages::CANCELLED
                } else {
                    messages::NOTHING_TO_CANCEL
                };
                self.reply(event, text).await
            }
            Command::Unknown(name) => {
                debug!("Unknown command /{}", name);
                self.reply(event, messages::UNKNOWN_COMMAND).await
            }
        }
    }

    async fn handle_text(&self, event: &InboundEvent) -> Result<(), ConversationError> {
        let Some(state) = self.states.get(&event.conversation_id).await else {
            // Group chats are left alone unless a flow is active.
            if event.is_group {
                return Ok(());
            }
            return self.reply(event, messages::IDLE_HINT).await;
        };

        if state.is_admin_flow() && !self.config.is_admin(&event.caller_id) {
            warn!(
                "Non-admin {} answered {} in {}",
                event.caller_id,
                state.name(),
                event.conversation_id
            );
            self.states.clear(&event.conversation_id).await;
            return self.reply(event, messages::ADMIN_ONLY).await;
        }

        match state {
            ConversationState::AwaitingName => self.on_name(event).await,
            ConversationState::AwaitingWishlist { name } => self.on_wishlist(event, &name).await,
            ConversationState::AwaitingNameForAssignment => {
                self.on_name_for_assignment(event).await
            }
            ConversationState::AwaitingClearConfirmation => {
                self.on_clear_confirmation(event).await
            }
            ConversationState::AwaitingNumGroups { roster } => {
                self.on_group_count(event, roster).await
            }
            ConversationState::AwaitingRestrictions {
                roster,
                group_count,
            } => self.on_restrictions(event, &roster, group_count).await,
        }
    }

    async fn on_name(&self, event: &InboundEvent) -> Result<(), ConversationError> {
        match sanitize_name(&event.text) {
            Ok(name) => {
                self.states
                    .set(
                        &event.conversation_id,
                        ConversationState::AwaitingWishlist { name },
                    )
                    .await;
                self.reply(event, messages::ASK_WISHLIST).await
            }
            Err(e) => {
                self.reply(event, &messages::invalid_name(&e.to_string()))
                    .await
            }
        }
    }

    async fn on_wishlist(&self, event: &InboundEvent, name: &str) -> Result<(), ConversationError> {
        // The flow ends here whether or not the write succeeds.
        self.states.clear(&event.conversation_id).await;

        let wishlist = if event.text.trim().eq_ignore_ascii_case("skip") {
            String::new()
        } else {
            sanitize_wishlist(&event.text)
        };

        match participant::upsert_participant(self.db.pool(), name, &wishlist).await {
            Ok(UpsertOutcome::Created) => {
                info!("Registered participant {}", name);
                self.reply(event, &messages::registered(name)).await
            }
            Ok(UpsertOutcome::Updated) => {
                info!("Updated wishlist for {}", name);
                self.reply(event, &messages::wishlist_updated(name)).await
            }
            Err(e) => {
                error!("Failed to register {}: {}", name, e);
                self.reply(event, &messages::registration_failed()).await
            }
        }
    }

    async fn on_name_for_assignment(&self, event: &InboundEvent) -> Result<(), ConversationError> {
        let name = match sanitize_name(&event.text) {
            Ok(name) => name,
            Err(e) => {
                return self
                    .reply(event, &messages::invalid_name(&e.to_string()))
                    .await
            }
        };
        self.states.clear(&event.conversation_id).await;

        if let Some(detail) = assignment::find_assignment_for_giver(self.db.pool(), &name).await? {
            return self.reply(event, &messages::assignment(&detail)).await;
        }

        match participant::find_participant_by_name(self.db.pool(), &name).await? {
            Some(p) => self.reply(event, &messages::no_assignment_yet(&p.name)).await,
            None => self.reply(event, &messages::not_registered(&name)).await,
        }
    }

    async fn on_clear_confirmation(&self, event: &InboundEvent) -> Result<(), ConversationError> {
        self.states.clear(&event.conversation_id).await;

        if !event.text.trim().eq_ignore_ascii_case("yes") {
            return self.reply(event, messages::CLEAR_CANCELLED).await;
        }

        assignment::clear_all_data(&self.db).await?;
        info!("Data cleared by {}", event.caller_id);
        self.reply(event, messages::CLEARED).await
    }

    async fn on_group_count(
        &self,
        event: &InboundEvent,
        roster: Vec<RosterEntry>,
    ) -> Result<(), ConversationError> {
        let participants = roster.len();
        let group_count = match event.text.trim().parse::<i64>() {
            Ok(n) if n >= 1 && n <= participants as i64 => n as usize,
            _ => {
                return self
                    .reply(event, &messages::invalid_group_count(participants))
                    .await
            }
        };

        self.states
            .set(
                &event.conversation_id,
                ConversationState::AwaitingRestrictions {
                    roster,
                    group_count,
                },
            )
            .await;
        self.reply(event, &messages::ask_restrictions(group_count))
            .await
    }

    async fn on_restrictions(
        &self,
        event: &InboundEvent,
        roster: &[RosterEntry],
        group_count: usize,
    ) -> Result<(), ConversationError> {
        let names: Vec<&str> = roster.iter().map(|e| e.name.as_str()).collect();
        let restrictions: RestrictionSet = match parse_restrictions(&event.text, &names) {
            Ok(parsed) => parsed.into_iter().collect(),
            Err(e) => {
                return self
                    .reply(event, &messages::invalid_restrictions(&e.to_string()))
                    .await
            }
        };
        self.states.clear(&event.conversation_id).await;

        match self.engine.run(roster, group_count, &restrictions).await {
            Ok(summary) => {
                self.reply(event, &messages::run_summary(&summary.render()))
                    .await
            }
            Err(e) if e.is_persistence_fault() => {
                error!("Assignment run failed: {}", e);
                self.reply(event, &messages::run_fault()).await
            }
            Err(e) => {
                warn!("Assignment run rejected: {}", e);
                self.reply(event, &messages::run_failed(&e.to_string()))
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sender::RecordingSender;
    use database::in_memory;
    use std::time::Duration;

    const ADMIN: &str = "+15550000000";
    const USER: &str = "+15551111111";

    struct Harness {
        db: Database,
        handler: ConversationHandler,
        sender: RecordingSender,
    }

    impl Harness {
        async fn new() -> Self {
            let db = in_memory().await.unwrap();
            let sender = RecordingSender::new();
            let handler = ConversationHandler::new(
                db.clone(),
                AssignmentEngine::with_defaults(db.clone()),
                Arc::new(sender.clone()),
                HandlerConfig::new(ADMIN),
            );
            Self { db, handler, sender }
        }

        async fn say(&self, caller: &str, text: &str) -> String {
            self.handler
                .handle(&InboundEvent::direct(caller, text))
                .await
                .unwrap();
            self.sender.last_text().await.unwrap_or_default()
        }

        async fn state(&self, caller: &str) -> Option<ConversationState> {
            self.handler.states().get(caller).await
        }

        async fn register(&self, caller: &str, name: &str, wishlist: &str) {
            self.say(caller, "/register").await;
            self.say(caller, name).await;
            self.say(caller, wishlist).await;
        }
    }

    #[tokio::test]
    async fn test_register_skip_then_update_wishlist() {
        let h = Harness::new().await;

        assert_eq!(h.say(USER, "/register").await, messages::ASK_NAME);
        assert_eq!(h.say(USER, "Alice").await, messages::ASK_WISHLIST);
        assert_eq!(
            h.state(USER).await,
            Some(ConversationState::AwaitingWishlist {
                name: "Alice".to_string()
            })
        );
        assert!(h.say(USER, "skip").await.contains("registered"));
        assert_eq!(h.state(USER).await, None);

        let alice = participant::find_participant_by_name(h.db.pool(), "Alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(alice.wishlist, "");

        h.register(USER, "Alice", "socks").await;
        let list = participant::list_participants(h.db.pool()).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, alice.id);
        assert_eq!(list[0].wishlist, "socks");
        assert!(h
            .sender
            .last_text()
            .await
            .unwrap()
            .contains("wishlist has been updated"));
    }

    #[tokio::test]
    async fn test_invalid_name_reprompts() {
        let h = Harness::new().await;
        h.say(USER, "/register").await;

        let reply = h.say(USER, "<script>").await;
        assert!(reply.contains("isn't valid"));
        assert_eq!(h.state(USER).await, Some(ConversationState::AwaitingName));
    }

    #[tokio::test]
    async fn test_myassignment_outcomes() {
        let h = Harness::new().await;
        h.register(USER, "Alice", "skip").await;
        h.register(USER, "Bob", "books").await;

        h.say(USER, "/myassignment").await;
        assert!(h.say(USER, "Zed").await.contains("not registered"));
        assert_eq!(h.state(USER).await, None);

        h.say(USER, "/myassignment").await;
        assert!(h.say(USER, "alice").await.contains("no assignment yet"));

        h.say(ADMIN, "/creategroups").await;
        h.say(ADMIN, "1").await;
        h.say(ADMIN, "none").await;

        h.say(USER, "/myassignment").await;
        let reply = h.say(USER, "ALICE").await;
        assert!(reply.contains("Secret Angel of Bob"));
        assert!(reply.contains("books"));
    }

    #[tokio::test]
    async fn test_admin_commands_rejected_for_others() {
        let h = Harness::new().await;
        h.say(USER, "/register").await;

        for command in ["/participants", "/creategroups", "/cleardata"] {
            assert_eq!(h.say(USER, command).await, messages::ADMIN_ONLY);
        }
        // Rejection leaves the running flow alone
        assert_eq!(h.state(USER).await, Some(ConversationState::AwaitingName));
    }

    #[tokio::test]
    async fn test_empty_or_zero_admin_id_disables_admin() {
        assert!(!HandlerConfig::new("").is_admin(""));
        assert!(!HandlerConfig::new("0").is_admin("0"));
        assert!(HandlerConfig::new(ADMIN).is_admin(ADMIN));
        assert!(!HandlerConfig::new(ADMIN).is_admin(USER));
    }

    #[tokio::test]
    async fn test_non_admin_reply_in_group_admin_flow_clears_state() {
        let h = Harness::new().await;
        h.register(USER, "Alice", "skip").await;
        h.register(USER, "Bob", "skip").await;

        let grp = "group-1";
        h.handler
            .handle(&InboundEvent::group(grp, ADMIN, "/cleardata"))
            .await
            .unwrap();
        h.handler
            .handle(&InboundEvent::group(grp, USER, "yes"))
            .await
            .unwrap();

        assert_eq!(h.sender.last_text().await.unwrap(), messages::ADMIN_ONLY);
        assert_eq!(h.handler.states().get(grp).await, None);
        assert_eq!(participant::count_participants(h.db.pool()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_cleardata_confirm_and_cancel() {
        let h = Harness::new().await;
        h.register(USER, "Alice", "skip").await;

        h.say(ADMIN, "/cleardata").await;
        assert_eq!(h.say(ADMIN, "nope").await, messages::CLEAR_CANCELLED);
        assert_eq!(participant::count_participants(h.db.pool()).await.unwrap(), 1);

        h.say(ADMIN, "/cleardata").await;
        assert_eq!(h.say(ADMIN, "YES").await, messages::CLEARED);
        assert_eq!(participant::count_participants(h.db.pool()).await.unwrap(), 0);
        assert_eq!(h.state(ADMIN).await, None);
    }

    #[tokio::test]
    async fn test_creategroups_needs_two_participants() {
        let h = Harness::new().await;
        h.register(USER, "Alice", "skip").await;

        assert_eq!(
            h.say(ADMIN, "/creategroups").await,
            messages::NOT_ENOUGH_PARTICIPANTS
        );
        assert_eq!(h.state(ADMIN).await, None);
    }

    #[tokio::test]
    async fn test_creategroups_full_flow() {
        let h = Harness::new().await;
        for name in ["Alice", "Bob", "Carol", "Dave", "Eve"] {
            h.register(USER, name, "skip").await;
        }

        assert!(h.say(ADMIN, "/creategroups").await.contains("5 participants"));

        assert_eq!(h.say(ADMIN, "0").await, messages::invalid_group_count(5));
        assert_eq!(h.say(ADMIN, "six").await, messages::invalid_group_count(5));
        assert!(matches!(
            h.state(ADMIN).await,
            Some(ConversationState::AwaitingNumGroups { .. })
        ));

        h.say(ADMIN, "2").await;
        assert!(matches!(
            h.state(ADMIN).await,
            Some(ConversationState::AwaitingRestrictions { group_count: 2, .. })
        ));

        // Unknown name keeps the state for another try
        let reply = h.say(ADMIN, "Alice, Zed").await;
        assert!(reply.contains("Zed"));
        assert!(matches!(
            h.state(ADMIN).await,
            Some(ConversationState::AwaitingRestrictions { .. })
        ));
        assert_eq!(assignment::count_assignments(h.db.pool()).await.unwrap(), 0);

        let reply = h.say(ADMIN, "Alice, Bob").await;
        assert!(reply.starts_with("Created 2 group(s) with 5 assignment(s)."));
        assert_eq!(h.state(ADMIN).await, None);
        assert_eq!(assignment::count_groups(h.db.pool()).await.unwrap(), 2);
        assert_eq!(assignment::count_assignments(h.db.pool()).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_infeasible_run_reports_no_changes() {
        let h = Harness::new().await;
        h.register(USER, "Alice", "skip").await;
        h.register(USER, "Bob", "skip").await;

        h.say(ADMIN, "/creategroups").await;
        h.say(ADMIN, "1").await;
        let reply = h.say(ADMIN, "Alice, Bob").await;

        assert!(reply.contains("Group 1"));
        assert!(reply.ends_with(messages::NO_CHANGES_SAVED));
        assert_eq!(h.state(ADMIN).await, None);
        assert_eq!(assignment::count_groups(h.db.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_command_during_restrictions_wins() {
        let h = Harness::new().await;
        h.register(USER, "Alice", "skip").await;
        h.register(USER, "Bob", "skip").await;

        h.say(ADMIN, "/creategroups").await;
        h.say(ADMIN, "1").await;

        assert_eq!(h.say(ADMIN, "/bogus").await, messages::UNKNOWN_COMMAND);
        assert_eq!(h.state(ADMIN).await, None);
        assert_eq!(assignment::count_groups(h.db.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cancel() {
        let h = Harness::new().await;
        assert_eq!(h.say(USER, "/cancel").await, messages::NOTHING_TO_CANCEL);

        h.say(USER, "/myassignment").await;
        assert_eq!(h.say(USER, "/cancel").await, messages::CANCELLED);
        assert_eq!(h.state(USER).await, None);
    }

    #[tokio::test]
    async fn test_participants_listing_for_admin() {
        let h = Harness::new().await;
        h.register(USER, "O'Brien", "tea & biscuits").await;

        let reply = h.say(ADMIN, "/participants").await;
        assert!(reply.contains("O'Brien - tea & biscuits"));
    }

    #[tokio::test]
    async fn test_idle_text() {
        let h = Harness::new().await;
        assert_eq!(h.say(USER, "hello").await, messages::IDLE_HINT);

        h.handler
            .handle(&InboundEvent::group("grp", USER, "hello everyone"))
            .await
            .unwrap();
        assert_eq!(h.sender.messages().await.len(), 1);
    }

    fn limited_handler(db: &Database, sender: &RecordingSender, max_messages: u32) -> ConversationHandler {
        ConversationHandler::new(
            db.clone(),
            AssignmentEngine::with_defaults(db.clone()),
            Arc::new(sender.clone()),
            HandlerConfig::new(ADMIN).with_rate_limit(RateLimit {
                max_messages,
                window: Duration::from_secs(60),
            }),
        )
    }

    #[tokio::test]
    async fn test_rate_limit() {
        let db = in_memory().await.unwrap();
        let sender = RecordingSender::new();
        let handler = limited_handler(&db, &sender, 1);

        handler
            .handle(&InboundEvent::direct(USER, "/register"))
            .await
            .unwrap();
        handler
            .handle(&InboundEvent::direct(USER, "Alice"))
            .await
            .unwrap();

        assert_eq!(sender.last_text().await.unwrap(), messages::RATE_LIMITED);
        assert_eq!(
            handler.states().get(USER).await,
            Some(ConversationState::AwaitingName)
        );

        // Further rejections in the same window stay quiet
        for _ in 0..3 {
            handler
                .handle(&InboundEvent::direct(USER, "Alice"))
                .await
                .unwrap();
        }
        let sent = sender.messages().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(
            sent.iter().filter(|m| m.text == messages::RATE_LIMITED).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_idle_group_chatter_past_limit_sends_nothing() {
        let db = in_memory().await.unwrap();
        let sender = RecordingSender::new();
        let handler = limited_handler(&db, &sender, 2);

        for i in 0..5 {
            handler
                .handle(&InboundEvent::group("grp", USER, &format!("just chatting {i}")))
                .await
                .unwrap();
        }

        assert!(sender.messages().await.is_empty());
        assert_eq!(handler.states().get("grp").await, None);

        // Chatter did not use up the caller's allowance
        handler
            .handle(&InboundEvent::group("grp", USER, "/help"))
            .await
            .unwrap();
        assert_eq!(sender.messages().await.len(), 1);
        assert_ne!(sender.last_text().await.unwrap(), messages::RATE_LIMITED);
    }

    #[tokio::test]
    async fn test_non_admin_reply_clears_group_count_flow() {
        let h = Harness::new().await;
        h.register(USER, "Alice", "skip").await;
        h.register(USER, "Bob", "skip").await;

        let grp = "group-1";
        h.handler
            .handle(&InboundEvent::group(grp, ADMIN, "/creategroups"))
            .await
            .unwrap();
        assert!(matches!(
            h.handler.states().get(grp).await,
            Some(ConversationState::AwaitingNumGroups { .. })
        ));

        h.handler
            .handle(&InboundEvent::group(grp, USER, "1"))
            .await
            .unwrap();

        assert_eq!(h.sender.last_text().await.unwrap(), messages::ADMIN_ONLY);
        assert_eq!(h.handler.states().get(grp).await, None);
        assert_eq!(assignment::count_assignments(h.db.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_non_admin_reply_clears_restrictions_flow() {
        let h = Harness::new().await;
        h.register(USER, "Alice", "skip").await;
        h.register(USER, "Bob", "skip").await;

        let grp = "group-1";
        for text in ["/creategroups", "1"] {
            h.handler
                .handle(&InboundEvent::group(grp, ADMIN, text))
                .await
                .unwrap();
        }
        assert!(matches!(
            h.handler.states().get(grp).await,
            Some(ConversationState::AwaitingRestrictions { group_count: 1, .. })
        ));

        h.handler
            .handle(&InboundEvent::group(grp, USER, "none"))
            .await
            .unwrap();

        assert_eq!(h.sender.last_text().await.unwrap(), messages::ADMIN_ONLY);
        assert_eq!(h.handler.states().get(grp).await, None);
        assert_eq!(assignment::count_assignments(h.db.pool()).await.unwrap(), 0);
        assert_eq!(assignment::count_groups(h.db.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_name_for_assignment_keeps_state() {
        let h = Harness::new().await;
        h.register(USER, "Alice", "skip").await;

        h.say(USER, "/myassignment").await;
        let reply = h.say(USER, "<b>").await;
        assert!(reply.contains("isn't valid"));
        assert_eq!(
            h.state(USER).await,
            Some(ConversationState::AwaitingNameForAssignment)
        );

        assert!(h.say(USER, "Alice").await.contains("no assignment yet"));
        assert_eq!(h.state(USER).await, None);
    }

    #[tokio::test]
    async fn test_with_stores_uses_given_instances() {
        let db = in_memory().await.unwrap();
        let sender = RecordingSender::new();

        let states = ConversationStore::with_capacity(1);
        states.set(USER, ConversationState::AwaitingName).await;
        let limiter = RateLimiter::new(RateLimit {
            max_messages: 1,
            window: Duration::from_secs(60),
        });

        let handler = ConversationHandler::with_stores(
            db.clone(),
            AssignmentEngine::with_defaults(db.clone()),
            Arc::new(sender.clone()),
            HandlerConfig::new(ADMIN),
            states,
            limiter,
        );

        // The seeded flow picks up the name directly
        handler
            .handle(&InboundEvent::direct(USER, "Alice"))
            .await
            .unwrap();
        assert_eq!(sender.last_text().await.unwrap(), messages::ASK_WISHLIST);

        // The injected limiter applies instead of the config default
        handler
            .handle(&InboundEvent::direct(USER, "socks"))
            .await
            .unwrap();
        assert_eq!(sender.last_text().await.unwrap(), messages::RATE_LIMITED);

        // Capacity of one evicts the older conversation
        handler
            .handle(&InboundEvent::direct(ADMIN, "/register"))
            .await
            .unwrap();
        assert_eq!(handler.states().len().await, 1);
        assert_eq!(handler.states().get(USER).await, None);
    }
}
