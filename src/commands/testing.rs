//! In-memory collaborators for command tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serenity::async_trait;
use tempfile::TempDir;

use crate::commands::context::{Directory, Invocation, Services};
use crate::commands::{parse, parse_command, run};
use crate::common::error::{DiscordError, ThreadResult};
use crate::common::{CategoryRef, Grantee, GuildRef, RoleRef, ThreadInfo, UserRef};
use crate::config::parser::load_config_str;
use crate::logs::{LogStore, LogUser};
use crate::permissions::Invoker;
use crate::settings::{Settings, SettingsStore};
use crate::threads::{CloseRequest, HistoryMessage, ReplyRequest, ThreadManager};
use crate::translations::Translator;
use crate::ui::{EmbedSpec, Reply};

pub const GUILD_ID: u64 = 1000;
pub const OWNER_ID: u64 = 1;
pub const STRANGER_ID: u64 = 2;
pub const RECIPIENT_ID: u64 = 50;
pub const COMMAND_CHANNEL: u64 = 500;
pub const THREAD_CHANNEL: u64 = 600;
pub const SUPPORT_ROLE: u64 = 300;
pub const ARCHIVE_CATEGORY: u64 = 700;

const BASE_CONFIG: &str = r#"
    discord {
        token = "token"
        guild_id = 1000
        owners = [1]
        prefix = "?"
    }
    logs {
        url = "https://logs.example.org"
        url_prefix = "NONE"
    }
"#;

#[derive(Default)]
struct ThreadState {
    threads: Vec<ThreadInfo>,
    next_channel: u64,
    created: Vec<(UserRef, UserRef, Option<CategoryRef>, u64)>,
    closes: Vec<CloseRequest>,
    scheduled: HashSet<u64>,
    replies: Vec<ReplyRequest>,
    notes: Vec<String>,
    history: Vec<HistoryMessage>,
    edits: Vec<(u64, String)>,
    deletes: Vec<u64>,
    moves: Vec<(u64, u64)>,
    nsfw: Vec<bool>,
    to_recipient: Vec<EmbedSpec>,
    to_channel: Vec<EmbedSpec>,
}

/// Records every thread operation instead of talking to Discord.
#[derive(Default)]
pub struct FakeThreads {
    state: Mutex<ThreadState>,
}

impl FakeThreads {
    pub fn insert(&self, thread: ThreadInfo) {
        self.state.lock().unwrap().threads.push(thread);
    }

    pub fn set_history(&self, history: Vec<HistoryMessage>) {
        self.state.lock().unwrap().history = history;
    }

    pub fn created(&self) -> Vec<(UserRef, UserRef, Option<CategoryRef>, u64)> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn closes(&self) -> Vec<CloseRequest> {
        self.state.lock().unwrap().closes.clone()
    }

    pub fn replies(&self) -> Vec<ReplyRequest> {
        self.state.lock().unwrap().replies.clone()
    }

    pub fn notes(&self) -> Vec<String> {
        self.state.lock().unwrap().notes.clone()
    }

    pub fn edits(&self) -> Vec<(u64, String)> {
        self.state.lock().unwrap().edits.clone()
    }

    pub fn deletes(&self) -> Vec<u64> {
        self.state.lock().unwrap().deletes.clone()
    }

    pub fn moves(&self) -> Vec<(u64, u64)> {
        self.state.lock().unwrap().moves.clone()
    }

    pub fn nsfw_flags(&self) -> Vec<bool> {
        self.state.lock().unwrap().nsfw.clone()
    }

    pub fn sent_to_recipient(&self) -> Vec<EmbedSpec> {
        self.state.lock().unwrap().to_recipient.clone()
    }

    pub fn sent_to_channel(&self) -> Vec<EmbedSpec> {
        self.state.lock().unwrap().to_channel.clone()
    }
}

#[async_trait]
impl ThreadManager for FakeThreads {
    async fn find_by_recipient(&self, recipient_id: u64) -> Option<ThreadInfo> {
        let state = self.state.lock().unwrap();
        state.threads.iter().find(|t| t.id() == recipient_id).cloned()
    }

    async fn find_by_channel(&self, channel_id: u64) -> Option<ThreadInfo> {
        let state = self.state.lock().unwrap();
        state
            .threads
            .iter()
            .find(|t| t.channel_id == channel_id)
            .cloned()
    }

    async fn create(
        &self,
        recipient: &UserRef,
        creator: &UserRef,
        category: Option<&CategoryRef>,
    ) -> ThreadResult<ThreadInfo> {
        let mut state = self.state.lock().unwrap();
        let channel_id = 900 + state.next_channel;
        state.next_channel += 1;
        let thread = ThreadInfo {
            recipient: recipient.clone(),
            channel_id,
        };
        state.threads.push(thread.clone());
        state
            .created
            .push((recipient.clone(), creator.clone(), category.cloned(), channel_id));
        Ok(thread)
    }

    async fn close(&self, thread: &ThreadInfo, request: CloseRequest) -> ThreadResult<()> {
        let mut state = self.state.lock().unwrap();
        if request.after == 0 {
            state.threads.retain(|t| t.id() != thread.id());
        } else {
            state.scheduled.insert(thread.id());
        }
        state.closes.push(request);
        Ok(())
    }

    async fn cancel_closure(&self, thread: &ThreadInfo) -> bool {
        self.state.lock().unwrap().scheduled.remove(&thread.id())
    }

    async fn reply(&self, _thread: &ThreadInfo, request: ReplyRequest) -> ThreadResult<()> {
        self.state.lock().unwrap().replies.push(request);
        Ok(())
    }

    async fn note(
        &self,
        _thread: &ThreadInfo,
        _author: &UserRef,
        content: &str,
        source_id: u64,
    ) -> ThreadResult<u64> {
        self.state.lock().unwrap().notes.push(content.to_string());
        Ok(source_id + 1)
    }

    async fn history(&self, _thread: &ThreadInfo, limit: u8) -> ThreadResult<Vec<HistoryMessage>> {
        let state = self.state.lock().unwrap();
        Ok(state.history.iter().take(limit as usize).cloned().collect())
    }

    async fn edit_message(
        &self,
        _thread: &ThreadInfo,
        linked_id: u64,
        content: &str,
    ) -> ThreadResult<()> {
        let mut state = self.state.lock().unwrap();
        state.edits.push((linked_id, content.to_string()));
        Ok(())
    }

    async fn delete_message(&self, _thread: &ThreadInfo, linked_id: u64) -> ThreadResult<()> {
        self.state.lock().unwrap().deletes.push(linked_id);
        Ok(())
    }

    async fn move_to(&self, thread: &ThreadInfo, category: &CategoryRef) -> ThreadResult<()> {
        let mut state = self.state.lock().unwrap();
        state.moves.push((thread.channel_id, category.id));
        Ok(())
    }

    async fn set_nsfw(&self, _thread: &ThreadInfo, nsfw: bool) -> ThreadResult<()> {
        self.state.lock().unwrap().nsfw.push(nsfw);
        Ok(())
    }

    async fn send_to_recipient(&self, _thread: &ThreadInfo, embed: EmbedSpec) -> ThreadResult<()> {
        self.state.lock().unwrap().to_recipient.push(embed);
        Ok(())
    }

    async fn send_to_channel(&self, _thread: &ThreadInfo, embed: EmbedSpec) -> ThreadResult<()> {
        self.state.lock().unwrap().to_channel.push(embed);
        Ok(())
    }
}

struct DirectoryState {
    users: Vec<UserRef>,
    roles: Vec<RoleRef>,
    categories: Vec<CategoryRef>,
    guild: Option<GuildRef>,
    created_categories: Vec<(String, Vec<Grantee>)>,
    created_channels: Vec<(String, u64)>,
    sent: Vec<(u64, EmbedSpec)>,
}

/// A small guild: an owner, a stranger, a recipient, one role and one category.
pub struct FakeDirectory {
    state: Mutex<DirectoryState>,
}

impl Default for FakeDirectory {
    fn default() -> Self {
        let mut owner = UserRef::new(OWNER_ID, "admin").with_discriminator(1);
        owner.avatar_url = Some("https://cdn.example/admin.png".to_string());
        Self {
            state: Mutex::new(DirectoryState {
                users: vec![
                    owner,
                    UserRef::new(STRANGER_ID, "stranger"),
                    UserRef::new(RECIPIENT_ID, "recipient").with_discriminator(4242),
                    UserRef::new(60, "other"),
                ],
                roles: vec![RoleRef {
                    id: SUPPORT_ROLE,
                    name: "Support".to_string(),
                }],
                categories: vec![CategoryRef {
                    id: ARCHIVE_CATEGORY,
                    name: "Archive".to_string(),
                }],
                guild: Some(GuildRef {
                    id: GUILD_ID,
                    name: "Test Guild".to_string(),
                    icon_url: Some("https://cdn.example/guild.png".to_string()),
                }),
                created_categories: Vec::new(),
                created_channels: Vec::new(),
                sent: Vec::new(),
            }),
        }
    }
}

impl FakeDirectory {
    pub fn add_user(&self, user: UserRef) {
        self.state.lock().unwrap().users.push(user);
    }

    pub fn add_category(&self, category: CategoryRef) {
        self.state.lock().unwrap().categories.push(category);
    }

    pub fn remove_guild(&self) {
        self.state.lock().unwrap().guild = None;
    }

    pub fn created_categories(&self) -> Vec<(String, Vec<Grantee>)> {
        self.state.lock().unwrap().created_categories.clone()
    }

    pub fn created_channels(&self) -> Vec<(String, u64)> {
        self.state.lock().unwrap().created_channels.clone()
    }

    pub fn sent(&self) -> Vec<(u64, EmbedSpec)> {
        self.state.lock().unwrap().sent.clone()
    }
}

#[async_trait]
impl Directory for FakeDirectory {
    async fn resolve_user(&self, arg: &str) -> Option<UserRef> {
        let state = self.state.lock().unwrap();
        if let Some(id) = parse::parse_user_id(arg) {
            return state.users.iter().find(|u| u.id == id).cloned();
        }
        let (name, discriminator) = parse::split_tag(arg);
        state
            .users
            .iter()
            .find(|u| u.name == name && (discriminator.is_none() || u.discriminator == discriminator))
            .cloned()
    }

    async fn resolve_role(&self, arg: &str) -> Option<RoleRef> {
        let state = self.state.lock().unwrap();
        match parse::parse_role_id(arg) {
            Some(id) => state.roles.iter().find(|r| r.id == id).cloned(),
            None => state.roles.iter().find(|r| r.name == arg).cloned(),
        }
    }

    async fn resolve_category(&self, arg: &str) -> Option<CategoryRef> {
        let state = self.state.lock().unwrap();
        match parse::parse_channel_id(arg) {
            Some(id) => state.categories.iter().find(|c| c.id == id).cloned(),
            None => state
                .categories
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(arg))
                .cloned(),
        }
    }

    async fn category(&self, id: u64) -> Option<CategoryRef> {
        let state = self.state.lock().unwrap();
        state.categories.iter().find(|c| c.id == id).cloned()
    }

    async fn fetch_user(&self, id: u64) -> Option<UserRef> {
        let state = self.state.lock().unwrap();
        state.users.iter().find(|u| u.id == id).cloned()
    }

    async fn guild(&self, id: u64) -> Option<GuildRef> {
        let state = self.state.lock().unwrap();
        state.guild.clone().filter(|g| g.id == id)
    }

    async fn modmail_guild(&self) -> Option<GuildRef> {
        self.state.lock().unwrap().guild.clone()
    }

    async fn resolve_grantee(&self, id: i64) -> Option<Grantee> {
        if id == crate::settings::EVERYONE {
            return Some(Grantee::Everyone);
        }
        let state = self.state.lock().unwrap();
        let id = id as u64;
        if let Some(user) = state.users.iter().find(|u| u.id == id) {
            return Some(Grantee::Member {
                id,
                name: user.name.clone(),
            });
        }
        state.roles.iter().find(|r| r.id == id).map(|r| Grantee::Role {
            id,
            name: r.name.clone(),
        })
    }

    async fn create_category(
        &self,
        name: &str,
        grants: &[Grantee],
    ) -> Result<CategoryRef, DiscordError> {
        let mut state = self.state.lock().unwrap();
        let category = CategoryRef {
            id: 800,
            name: name.to_string(),
        };
        state.categories.push(category.clone());
        state
            .created_categories
            .push((name.to_string(), grants.to_vec()));
        Ok(category)
    }

    async fn create_text_channel(
        &self,
        name: &str,
        category: &CategoryRef,
    ) -> Result<u64, DiscordError> {
        let mut state = self.state.lock().unwrap();
        state.created_channels.push((name.to_string(), category.id));
        Ok(810)
    }

    async fn send_embed(&self, channel_id: u64, embed: EmbedSpec) -> Result<(), DiscordError> {
        self.state.lock().unwrap().sent.push((channel_id, embed));
        Ok(())
    }
}

/// Services wired to fakes, plus helpers to run command text through them.
pub struct Harness {
    pub services: Services,
    pub threads: Arc<FakeThreads>,
    pub directory: Arc<FakeDirectory>,
    _dir: TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_config("").await
    }

    /// Extra HOCON appended to the base test config.
    pub async fn with_config(extra: &str) -> Self {
        Self::build(extra, Translator::identity()).await
    }

    /// Harness answering in the language of `catalog`, a CSV document.
    pub async fn with_catalog(catalog: &str) -> Self {
        let translator = Translator::from_reader("xx", catalog.as_bytes()).unwrap();
        Self::build("", translator).await
    }

    async fn build(extra: &str, translator: Translator) -> Self {
        let config = load_config_str(&format!("{}\n{}", BASE_CONFIG, extra)).unwrap();
        let dir = TempDir::new().unwrap();
        let logs = LogStore::open(&dir.path().join("logs.db"), GUILD_ID, config.log_base_url())
            .await
            .unwrap();

        let threads = Arc::new(FakeThreads::default());
        let directory = Arc::new(FakeDirectory::default());
        let services = Services {
            config: Arc::new(config),
            settings: Arc::new(SettingsStore::in_memory(Settings::default())),
            logs,
            threads: threads.clone(),
            directory: directory.clone(),
            translator: Arc::new(translator),
        };

        Self {
            services,
            threads,
            directory,
            _dir: dir,
        }
    }

    pub fn recipient() -> UserRef {
        UserRef::new(RECIPIENT_ID, "recipient").with_discriminator(4242)
    }

    /// Open a thread for the recipient in `THREAD_CHANNEL`, with a log entry.
    pub async fn open_thread(&self) -> ThreadInfo {
        let thread = ThreadInfo {
            recipient: Self::recipient(),
            channel_id: THREAD_CHANNEL,
        };
        self.threads.insert(thread.clone());
        self.services
            .logs
            .create_log(
                THREAD_CHANNEL,
                &LogUser::from_user(&thread.recipient, false),
                &LogUser::from_user(&thread.recipient, false),
            )
            .await
            .unwrap();
        thread
    }

    fn invocation(&self, user_id: u64, channel_id: u64) -> Invocation {
        let author = if user_id == OWNER_ID {
            UserRef::new(OWNER_ID, "admin").with_discriminator(1)
        } else {
            UserRef::new(user_id, "stranger")
        };
        Invocation {
            author,
            invoker: Invoker {
                user_id,
                role_ids: Vec::new(),
                is_guild_admin: false,
                in_modmail_guild: true,
            },
            guild_id: Some(GUILD_ID),
            channel_id,
            message_id: 123_456,
            attachments: Vec::new(),
            now: Utc::now(),
        }
    }

    async fn run_with(&self, invocation: Invocation, content: &str) -> Reply {
        match parse_command(&self.services, content).await {
            Some(planned) => run(&self.services, &invocation, &planned).await,
            None => Reply::none(),
        }
    }

    /// Run `content` as the owner in a plain staff channel.
    pub async fn run(&self, content: &str) -> Reply {
        self.run_with(self.invocation(OWNER_ID, COMMAND_CHANNEL), content)
            .await
    }

    /// Run `content` as a user with no permissions.
    pub async fn run_as_stranger(&self, content: &str) -> Reply {
        self.run_with(self.invocation(STRANGER_ID, COMMAND_CHANNEL), content)
            .await
    }

    /// Run `content` as the owner inside the thread channel.
    pub async fn run_in_thread(&self, content: &str) -> Reply {
        self.run_with(self.invocation(OWNER_ID, THREAD_CHANNEL), content)
            .await
    }
}
