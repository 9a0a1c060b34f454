use thiserror::Error;

use crate::roster::{decode, encode, RosterEntry};

pub const MAX_NAME_LEN: usize = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignupError {
    #[error("ニックネームは1〜50文字で、「(」と改行は使えません。")]
    InvalidName,
    #[error("その名前はすでに登録されています。")]
    DuplicateSignup,
    #[error("定員に達しているため参加登録できません。")]
    RosterFull,
    #[error("募集メッセージを読み取れませんでした。")]
    MalformedBody,
}

/// 1回の参加登録を本文に適用し、更新後の本文を返す。
///
/// 純粋関数であり、本文の取得と書き戻しは呼び出し側が行う。
/// エラーの場合、本文は一切変更しない。
pub fn apply_signup(body: &str, new_name: &str, new_identity: &str) -> Result<String, SignupError> {
    let name = new_name.trim();
    // フォーム側でも制限しているが、ここでも検証する。
    // 「(」は行内でメンションとの区切りに使うため名前には含められない。
    // 改行も1行1エントリの形式を壊すので弾く。
    if name.is_empty()
        || name.chars().count() > MAX_NAME_LEN
        || name.contains(['(', '\n', '\r'])
    {
        return Err(SignupError::InvalidName);
    }
    if body.trim().is_empty() {
        return Err(SignupError::MalformedBody);
    }

    let (header, mut roster) = decode(body);

    if roster.entries.iter().any(|e| e.display_name == name) {
        return Err(SignupError::DuplicateSignup);
    }
    if roster.is_full() {
        return Err(SignupError::RosterFull);
    }

    roster.entries.push(RosterEntry {
        display_name: name.to_string(),
        identity_mention: new_identity.to_string(),
    });
    Ok(encode(&header, &roster))
}
