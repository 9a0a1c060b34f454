use anyhow::{anyhow, Context as _, Result};
use regex::Regex;
use serenity::all::{
    ActionRowComponent, ButtonStyle, ChannelId, Command, CommandInteraction, ComponentInteraction,
    Context, CreateActionRow, CreateButton, CreateCommand, CreateForumPost, CreateInputText,
    CreateInteractionResponse, CreateInteractionResponseMessage, CreateMessage, CreateModal,
    EditMessage, EventHandler, InputTextStyle, Interaction, MessageId, ModalInteraction, Ready,
};
use serenity::async_trait;
use thiserror::Error;
use tracing::{error, info};

use crate::roster::{encode, Roster, DEFAULT_CAPACITY};
use crate::signup::{apply_signup, SignupError, MAX_NAME_LEN};

pub const MAX_CAPACITY: usize = 16;

const CREATE_MODAL_ID: &str = "raid_create";
const SIGNUP_BUTTON_ID: &str = "raid_signup";
const SIGNUP_MODAL_PREFIX: &str = "signup_form";

pub struct Handler {
    pub raid_channel: ChannelId,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CreateFormError {
    #[error("日付は YYYY-MM-DD 形式で入力してください。")]
    BadDate,
    #[error("時刻は HH:MM 形式で入力してください。")]
    BadTime,
    #[error("レイド種別を入力してください。")]
    EmptyKind,
    #[error("定員は1〜16の数字で入力してください。")]
    BadCapacity,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);

        let command = CreateCommand::new("raid").description("レイド募集を作成します");
        if let Err(e) = Command::set_global_commands(&ctx.http, vec![command]).await {
            error!("Failed to register slash commands: {e}");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) if command.data.name == "raid" => {
                if let Err(e) = open_create_modal(&ctx, &command).await {
                    error!("Failed to open raid creation form: {e}");
                }
            }
            Interaction::Component(component)
                if component.data.custom_id == SIGNUP_BUTTON_ID =>
            {
                if let Err(e) = open_signup_modal(&ctx, &component).await {
                    error!("Failed to open signup form: {e}");
                }
            }
            Interaction::Modal(modal) => {
                let result = if modal.data.custom_id == CREATE_MODAL_ID {
                    self.handle_create_submit(&ctx, &modal).await
                } else if modal.data.custom_id.starts_with(SIGNUP_MODAL_PREFIX) {
                    handle_signup_submit(&ctx, &modal).await
                } else {
                    return;
                };
                let reply = match result {
                    Ok(reply) => reply,
                    Err(e) => {
                        // 入力ミス以外 (取得・書き戻しの失敗など) はログにも残す
                        if e.downcast_ref::<SignupError>().is_none()
                            && e.downcast_ref::<CreateFormError>().is_none()
                        {
                            error!("interaction failed: {e:#}");
                        }
                        e.to_string()
                    }
                };

                let response = CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new()
                        .content(reply)
                        .ephemeral(true),
                );
                if let Err(e) = modal.create_response(&ctx.http, response).await {
                    error!("Failed to respond to modal submission: {e}");
                }
            }
            _ => {}
        }
    }
}

impl Handler {
    /// 募集フォームの入力から告知メッセージを組み立て、
    /// フォーラムチャンネルに投稿する。
    async fn handle_create_submit(&self, ctx: &Context, modal: &ModalInteraction) -> Result<String> {
        let date = modal_value(modal, "raid_date").unwrap_or("").trim();
        let time = modal_value(modal, "raid_time").unwrap_or("").trim();
        let kind = modal_value(modal, "raid_kind").unwrap_or("").trim();
        let capacity_raw = modal_value(modal, "raid_capacity").unwrap_or("").trim();

        let capacity = validate_create_form(date, time, kind, capacity_raw)?;

        let header = format!(
            "📣 レイド募集: {kind}\n🗓 {date} {time}\n\n下の「参加する」ボタンから参加登録してください。"
        );
        let body = encode(&header, &Roster::empty(capacity));

        let message = CreateMessage::new()
            .content(body)
            .components(vec![CreateActionRow::Buttons(vec![
                CreateButton::new(SIGNUP_BUTTON_ID)
                    .label("参加する")
                    .style(ButtonStyle::Primary),
            ])]);
        let post = CreateForumPost::new(format!("{date} {time} {kind}"), message);

        let thread = self
            .raid_channel
            .create_forum_post(&ctx.http, post)
            .await
            .context("募集の投稿に失敗しました。")?;
        info!("Created raid announcement in thread {}", thread.id);

        Ok("募集を作成しました！".to_string())
    }
}

async fn open_create_modal(ctx: &Context, command: &CommandInteraction) -> Result<()> {
    let modal = CreateModal::new(CREATE_MODAL_ID, "レイド募集の作成").components(vec![
        CreateActionRow::InputText(
            CreateInputText::new(InputTextStyle::Short, "日付 (YYYY-MM-DD)", "raid_date")
                .placeholder("2026-09-01")
                .required(true),
        ),
        CreateActionRow::InputText(
            CreateInputText::new(InputTextStyle::Short, "時刻 (HH:MM)", "raid_time")
                .placeholder("21:00")
                .required(true),
        ),
        CreateActionRow::InputText(
            CreateInputText::new(InputTextStyle::Short, "レイド種別", "raid_kind")
                .placeholder("討滅戦")
                .required(true),
        ),
        CreateActionRow::InputText(
            CreateInputText::new(InputTextStyle::Short, "定員 (1〜16)", "raid_capacity")
                .placeholder("8")
                .required(false),
        ),
    ]);

    command
        .create_response(&ctx.http, CreateInteractionResponse::Modal(modal))
        .await?;
    Ok(())
}

async fn open_signup_modal(ctx: &Context, component: &ComponentInteraction) -> Result<()> {
    // どのメッセージへの登録かを custom_id に埋めておく
    let custom_id = format!(
        "{SIGNUP_MODAL_PREFIX}:{}:{}",
        component.channel_id, component.message.id,
    );
    let modal = CreateModal::new(custom_id, "参加登録").components(vec![
        CreateActionRow::InputText(
            CreateInputText::new(InputTextStyle::Short, "ニックネーム", "signup_name")
                .min_length(1)
                .max_length(MAX_NAME_LEN as u16)
                .required(true),
        ),
    ]);

    component
        .create_response(&ctx.http, CreateInteractionResponse::Modal(modal))
        .await?;
    Ok(())
}

/// 参加登録1件分のトランザクション。本文を取得し直してから
/// `apply_signup` を適用し、結果を書き戻す。
async fn handle_signup_submit(ctx: &Context, modal: &ModalInteraction) -> Result<String> {
    let (channel_id, message_id) = parse_signup_modal_id(&modal.data.custom_id)
        .ok_or_else(|| anyhow!("募集メッセージを特定できませんでした。"))?;
    let name = modal_value(modal, "signup_name").unwrap_or("");
    let identity = format!("(<@{}>)", modal.user.id);

    let message = channel_id
        .message(&ctx.http, message_id)
        .await
        .context("募集メッセージの取得に失敗しました。")?;

    let updated = apply_signup(&message.content, name, &identity)?;

    channel_id
        .edit_message(&ctx.http, message_id, EditMessage::new().content(updated))
        .await
        .context("募集メッセージの更新に失敗しました。")?;

    Ok("参加登録しました！".to_string())
}

fn parse_signup_modal_id(custom_id: &str) -> Option<(ChannelId, MessageId)> {
    let mut parts = custom_id.split(':');
    if parts.next() != Some(SIGNUP_MODAL_PREFIX) {
        return None;
    }
    let channel_id = parts.next()?.parse::<u64>().ok()?;
    let message_id = parts.next()?.parse::<u64>().ok()?;
    Some((ChannelId::new(channel_id), MessageId::new(message_id)))
}

fn modal_value<'a>(modal: &'a ModalInteraction, id: &str) -> Option<&'a str> {
    modal
        .data
        .components
        .iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            ActionRowComponent::InputText(input) if input.custom_id == id => {
                input.value.as_deref()
            }
            _ => None,
        })
}

/// 募集フォームの入力チェック。通れば定員を返す。
fn validate_create_form(
    date: &str,
    time: &str,
    kind: &str,
    capacity_raw: &str,
) -> Result<usize, CreateFormError> {
    if !Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap().is_match(date) {
        return Err(CreateFormError::BadDate);
    }
    if !Regex::new(r"^([01]?\d|2[0-3]):[0-5]\d$").unwrap().is_match(time) {
        return Err(CreateFormError::BadTime);
    }
    if kind.is_empty() {
        return Err(CreateFormError::EmptyKind);
    }
    parse_capacity_input(capacity_raw).ok_or(CreateFormError::BadCapacity)
}

/// 空欄ならデフォルト定員、それ以外は1〜16の数字のみ受け付ける。
fn parse_capacity_input(raw: &str) -> Option<usize> {
    if raw.is_empty() {
        return Some(DEFAULT_CAPACITY);
    }
    raw.parse::<usize>()
        .ok()
        .filter(|c| (1..=MAX_CAPACITY).contains(c))
}
