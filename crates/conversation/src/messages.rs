//! Reply texts.

use std::borrow::Cow;
use std::fmt::Write;

use database::{AssignmentDetail, Participant};

pub const WELCOME: &str = "Welcome to Secret Angel!\n\n\
Send /register to sign up with your name and wishlist, \
or /myassignment to find out who you are buying for.\n\
Send /help to see every command.";

pub const RATE_LIMITED: &str = "You're sending messages too quickly. Please wait a moment and try again.";

pub const ADMIN_ONLY: &str = "Sorry, that command is for the organizer only.";

pub const GENERIC_FAILURE: &str = "Something went wrong on our side. Please try again later.";

pub const UNKNOWN_COMMAND: &str = "I don't know that command. Send /help to see what I can do.";

pub const IDLE_HINT: &str = "Send /help to see what I can do.";

pub const ASK_NAME: &str = "What's your name?";

pub const ASK_NAME_FOR_ASSIGNMENT: &str = "What name did you register with?";

pub const ASK_WISHLIST: &str =
    "Thanks! Now tell me your wishlist, or send \"skip\" to leave it empty.";

pub const NOT_ENOUGH_PARTICIPANTS: &str =
    "At least 2 registered participants are needed to create groups.";

pub const CONFIRM_CLEAR: &str = "This will delete ALL participants, groups and assignments.\n\
Reply \"yes\" to confirm. Anything else cancels.";

pub const CLEARED: &str = "All data has been deleted.";

pub const CLEAR_CANCELLED: &str = "Cancelled. Nothing was deleted.";

pub const CANCELLED: &str = "Cancelled.";

pub const NOTHING_TO_CANCEL: &str = "Nothing to cancel.";

pub const NO_PARTICIPANTS: &str = "No one has registered yet.";

pub const RESTRICTIONS_HELP: &str = "Send restrictions as one pair per line, for example:\n\
Alice, Bob\n\
Carol, Dave\n\
Restricted pairs will never be matched with each other. Send \"none\" for no restrictions.";

pub const NO_CHANGES_SAVED: &str = "No changes were saved.";

/// Stored names and wishlists are entity-escaped; undo that for display.
pub fn display(stored: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(stored)
}

pub fn help(is_admin: bool) -> String {
    let mut out = String::from(
        "Commands:\n\
/register - sign up or update your wishlist\n\
/myassignment - see who you are buying for\n\
/cancel - stop what you're doing\n\
/help - show this message",
    );
    if is_admin {
        out.push_str(
            "\n\nOrganizer commands:\n\
/participants - list everyone registered\n\
/creategroups - split participants into groups and assign angels\n\
/cleardata - delete everything",
        );
    }
    out
}

pub fn invalid_name(reason: &str) -> String {
    format!("That name isn't valid: {reason}.\nPlease send your name again.")
}

pub fn registered(name: &str) -> String {
    format!("You're registered, {}!", display(name))
}

pub fn wishlist_updated(name: &str) -> String {
    format!("Welcome back, {}. Your wishlist has been updated.", display(name))
}

pub fn registration_failed() -> String {
    format!("Your registration could not be saved. {GENERIC_FAILURE}")
}

pub fn assignment(detail: &AssignmentDetail) -> String {
    let mut out = format!(
        "{}: you are the Secret Angel of {}!",
        display(&detail.group_label),
        display(&detail.receiver_name)
    );
    if detail.receiver_wishlist.is_empty() {
        out.push_str("\nThey haven't shared a wishlist.");
    } else {
        let _ = write!(out, "\nTheir wishlist: {}", display(&detail.receiver_wishlist));
    }
    out
}

pub fn no_assignment_yet(name: &str) -> String {
    format!(
        "{} is registered but has no assignment yet. Check back after the organizer creates groups.",
        display(name)
    )
}

pub fn not_registered(name: &str) -> String {
    format!(
        "{} is not registered. Send /register to sign up.",
        display(name)
    )
}

pub fn participants(list: &[Participant]) -> String {
    if list.is_empty() {
        return NO_PARTICIPANTS.to_string();
    }

    let mut out = format!("Registered participants ({}):", list.len());
    for (index, p) in list.iter().enumerate() {
        let _ = write!(out, "\n{}. {}", index + 1, display(&p.name));
        if !p.wishlist.is_empty() {
            let _ = write!(out, " - {}", display(&p.wishlist));
        }
    }
    out
}

pub fn ask_group_count(participants: usize) -> String {
    format!("There are {participants} participants. How many groups should I create? (1-{participants})")
}

pub fn invalid_group_count(participants: usize) -> String {
    format!("Please send a whole number between 1 and {participants}.")
}

pub fn ask_restrictions(group_count: usize) -> String {
    format!("Creating {group_count} group(s).\n\n{RESTRICTIONS_HELP}")
}

pub fn invalid_restrictions(reason: &str) -> String {
    format!("{}.\n\n{RESTRICTIONS_HELP}", display(reason))
}

pub fn run_summary(rendered: &str) -> String {
    display(rendered).into_owned()
}

pub fn run_failed(reason: &str) -> String {
    format!("Could not create groups: {}. {NO_CHANGES_SAVED}", display(reason))
}

pub fn run_fault() -> String {
    format!("Could not create groups. {NO_CHANGES_SAVED} Please try again later.")
}
