//! Inbound events and command parsing.

/// A text message received from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Where replies go: the sender for direct chats, the group id otherwise.
    pub conversation_id: String,
    /// Who sent the message.
    pub caller_id: String,
    /// Raw message text.
    pub text: String,
    /// Whether the conversation is a group chat.
    pub is_group: bool,
}

impl InboundEvent {
    /// A direct message, where the conversation is the caller.
    pub fn direct(caller_id: impl Into<String>, text: impl Into<String>) -> Self {
        let caller_id = caller_id.into();
        Self {
            conversation_id: caller_id.clone(),
            caller_id,
            text: text.into(),
            is_group: false,
        }
    }

    /// A message sent in a group chat.
    pub fn group(
        group_id: impl Into<String>,
        caller_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id: group_id.into(),
            caller_id: caller_id.into(),
            text: text.into(),
            is_group: true,
        }
    }
}

/// Top-level commands. Any text starting with `/` is a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Register,
    MyAssignment,
    Participants,
    CreateGroups,
    ClearData,
    Cancel,
    Unknown(String),
}

impl Command {
    /// Parse a command from message text, `None` for plain text.
    ///
    /// Arguments after the command word and `@botname` suffixes are ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let word = trimmed.strip_prefix('/')?.split_whitespace().next().unwrap_or("");
        let name = word.split('@').next().unwrap_or("").to_lowercase();

        let command = match name.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "register" => Command::Register,
            "myassignment" => Command::MyAssignment,
            "participants" => Command::Participants,
            "creategroups" => Command::CreateGroups,
            "cleardata" => Command::ClearData,
            "cancel" => Command::Cancel,
            _ => Command::Unknown(name),
        };
        Some(command)
    }

    /// Whether only the admin may run this command.
    pub fn is_admin_only(&self) -> bool {
        matches!(
            self,
            Command::Participants | Command::CreateGroups | Command::ClearData
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("  /Register  "), Some(Command::Register));
        assert_eq!(Command::parse("/myassignment now"), Some(Command::MyAssignment));
        assert_eq!(Command::parse("/creategroups@AngelBot"), Some(Command::CreateGroups));
        assert_eq!(
            Command::parse("/dance"),
            Some(Command::Unknown("dance".to_string()))
        );
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(Command::parse("Alice"), None);
        assert_eq!(Command::parse("Alice, Bob"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn test_admin_only_commands() {
        assert!(Command::CreateGroups.is_admin_only());
        assert!(Command::ClearData.is_admin_only());
        assert!(Command::Participants.is_admin_only());
        assert!(!Command::Register.is_admin_only());
    }

    #[test]
    fn test_direct_event_uses_caller_as_conversation() {
        let event = InboundEvent::direct("+1555", "hi");
        assert_eq!(event.conversation_id, "+1555");
        assert!(!event.is_group);

        let event = InboundEvent::group("grp", "+1555", "hi");
        assert_eq!(event.conversation_id, "grp");
        assert!(event.is_group);
    }
}
