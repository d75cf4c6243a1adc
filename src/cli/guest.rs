use std::path::Path;

use anyhow::Result;
use clap::Subcommand;

use crate::core::AppConfig;
use crate::guest::conversation::GUEST_MODELS;
use crate::guest::{
    FileStorage, FingerprintSignals, GuestConversation, GuestMessage, GuestQuotaTracker,
    GuestStores, QuotaConfig,
};
use crate::llm::Role;

#[derive(Subcommand, Clone, Debug)]
pub enum GuestAction {
    /// Print the current quota
    Status,
    /// Record a guest message if the quota allows it
    #[command(name = "send")]
    SendMessage {
        #[arg(long)]
        message: String,
        #[arg(long, default_value = GUEST_MODELS[0])]
        model: String,
    },
    /// Set the message count back to zero
    Reset,
    /// Sign in, discarding the guest quota and conversation
    SignIn,
    /// Sign out and pick the guest quota back up from storage
    SignOut,
    /// Remove all guest state
    Clear,
}

fn tracker(config: &AppConfig, dir: &Path) -> GuestQuotaTracker {
    let quota_config = QuotaConfig {
        max_messages: config.guest_message_limit,
        ..QuotaConfig::default()
    };
    let mut tracker = GuestQuotaTracker::new(
        quota_config,
        GuestStores::in_dir(dir),
        FingerprintSignals::from_host(),
    );
    tracker.initialize();
    tracker
}

fn conversation(dir: &Path) -> GuestConversation {
    GuestConversation::load(Box::new(FileStorage::new(dir.join("session.json"))))
}

fn print_status(tracker: &GuestQuotaTracker) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&tracker.status())?);
    Ok(())
}

pub fn run(action: GuestAction, config: &AppConfig) -> Result<()> {
    let dir = Path::new(&config.guest_path);
    let mut tracker = tracker(config, dir);

    match action {
        GuestAction::Status => {
            let conversation = conversation(dir);
            print_status(&tracker)?;
            println!("Messages in conversation: {}", conversation.messages().len());
        }
        GuestAction::SendMessage { message, model } => {
            if !tracker.can_send() {
                println!(
                    "Guest message limit reached ({}/{}). Sign in to keep chatting.",
                    tracker.count(),
                    tracker.max_messages()
                );
                return Ok(());
            }
            let mut conversation = conversation(dir);
            conversation.add_message(GuestMessage::new(&model, Role::User, &message));
            let count = tracker.increment();
            println!(
                "Sent message {}/{} to {}. {} remaining.",
                count,
                tracker.max_messages(),
                model,
                tracker.remaining()
            );
        }
        GuestAction::Reset => {
            tracker.reset_count();
            println!("Guest message count reset");
            print_status(&tracker)?;
        }
        GuestAction::SignIn => {
            tracker.reset_on_sign_in();
            conversation(dir).clear();
            println!("Signed in. Guest quota and conversation cleared");
        }
        GuestAction::SignOut => {
            tracker.force_reinitialize();
            println!("Signed out. Back to guest mode");
            print_status(&tracker)?;
        }
        GuestAction::Clear => {
            tracker.clear_all_storage();
            conversation(dir).clear();
            println!("Cleared all guest storage");
        }
    }

    Ok(())
}
