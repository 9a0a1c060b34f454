use regex::Regex;

pub const DEFAULT_CAPACITY: usize = 8;

const DIVIDER: &str = "──────────";
const LIST_LABEL: &str = "📋 参加者リスト";
const BULLET: &str = "- ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub display_name: String,
    pub identity_mention: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    pub entries: Vec<RosterEntry>,
    pub capacity: usize,
}

impl Roster {
    pub fn empty(capacity: usize) -> Roster {
        Roster {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }
}

/// 募集メッセージの本文をヘッダーと参加者リストに分解する。
///
/// マーカーが見つからない場合は本文全体をヘッダーとして扱い、
/// 定員8の空リストを返す。リスト部分の壊れた行は無視する
/// (本文は手で編集されている可能性があるため)。
pub fn decode(body: &str) -> (String, Roster) {
    let marker = format!("{DIVIDER}\n{LIST_LABEL}");
    let Some(pos) = body.find(&marker) else {
        return (body.trim().to_string(), Roster::empty(DEFAULT_CAPACITY));
    };

    let header = body[..pos].trim().to_string();

    let mut lines = body[pos..].lines();
    lines.next(); // 区切り線
    // (X/Y) の Y を定員として読む。X は実際の行数から数え直すため捨てる。
    // 手編集で (X/Y) ごと消された場合、作成時の定員はもうどこにも
    // 残っていないのでデフォルトの8に戻す。
    let capacity = lines
        .next()
        .and_then(parse_marker_capacity)
        .unwrap_or(DEFAULT_CAPACITY)
        .max(1);

    let mut entries = Vec::new();
    for line in lines {
        let Some(rest) = line.strip_prefix(BULLET) else {
            continue;
        };
        let (name, mention) = match rest.find('(') {
            Some(i) => (rest[..i].trim(), &rest[i..]),
            None => (rest.trim(), ""),
        };
        if name.is_empty() {
            continue;
        }
        entries.push(RosterEntry {
            display_name: name.to_string(),
            identity_mention: mention.to_string(),
        });
    }
    entries.sort_by(|a, b| a.display_name.cmp(&b.display_name));

    (header, Roster { entries, capacity })
}

/// ヘッダーと参加者リストから本文を組み立て直す。
/// 出力を再度 `decode` すると同じ結果になる。
pub fn encode(header: &str, roster: &Roster) -> String {
    let mut entries = roster.entries.clone();
    entries.sort_by(|a, b| a.display_name.cmp(&b.display_name));

    let mut body = format!(
        "{}\n\n{DIVIDER}\n{LIST_LABEL} ({}/{})",
        header.trim(),
        entries.len(),
        roster.capacity,
    );
    for entry in &entries {
        body.push('\n');
        body.push_str(BULLET);
        body.push_str(&entry.display_name);
        if !entry.identity_mention.is_empty() {
            body.push(' ');
            body.push_str(&entry.identity_mention);
        }
    }
    body
}

fn parse_marker_capacity(line: &str) -> Option<usize> {
    let re = Regex::new(r"\(\d+/(\d+)\)").unwrap();
    re.captures(line)?[1].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, mention: &str) -> RosterEntry {
        RosterEntry {
            display_name: name.to_string(),
            identity_mention: mention.to_string(),
        }
    }

    #[test]
    fn decode_without_marker_returns_empty_roster() {
        let (header, roster) = decode("ただのお知らせです。\n");
        assert_eq!(header, "ただのお知らせです。");
        assert_eq!(roster.entries, vec![]);
        assert_eq!(roster.capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn roundtrip_is_identity() {
        let header = "📣 レイド募集: 討滅戦\n🗓 2026-09-01 21:00";
        let roster = Roster {
            entries: vec![entry("Alice", "(<@111>)"), entry("Bob", "(<@222>)")],
            capacity: 8,
        };
        let body = encode(header, &roster);
        let (header2, roster2) = decode(&body);
        assert_eq!(header2, header);
        assert_eq!(roster2, roster);
        // 二重にエンコードしてもバイト単位で同じ
        assert_eq!(encode(&header2, &roster2), body);
    }

    #[test]
    fn encode_sorts_entries_case_sensitively() {
        let roster = Roster {
            entries: vec![entry("dan", "(<@2>)"), entry("Dan", "(<@1>)")],
            capacity: 8,
        };
        let body = encode("h", &roster);
        let dan_upper = body.find("- Dan").unwrap();
        let dan_lower = body.find("- dan").unwrap();
        assert!(dan_upper < dan_lower);
    }

    #[test]
    fn marker_capacity_is_authoritative() {
        // 定員は実際の行数ではなくマーカー行の (X/Y) から読む
        let body = format!("募集\n\n{DIVIDER}\n{LIST_LABEL} (0/3)\n- Alice (<@1>)");
        let (_, roster) = decode(&body);
        assert_eq!(roster.capacity, 3);
        assert_eq!(roster.entries.len(), 1);
    }

    #[test]
    fn malformed_lines_are_ignored() {
        let body = format!(
            "募集\n\n{DIVIDER}\n{LIST_LABEL} (2/8)\n- Alice (<@1>)\n手で書き足されたメモ\n- Bob (<@2>)\n- "
        );
        let (_, roster) = decode(&body);
        assert_eq!(roster.entries, vec![entry("Alice", "(<@1>)"), entry("Bob", "(<@2>)")]);
    }

    #[test]
    fn entry_without_mention_keeps_name_only() {
        let body = format!("募集\n\n{DIVIDER}\n{LIST_LABEL} (1/8)\n- Alice");
        let (_, roster) = decode(&body);
        assert_eq!(roster.entries, vec![entry("Alice", "")]);
        // メンションなしの行もそのまま往復する
        let (_, roster2) = decode(&encode("募集", &roster));
        assert_eq!(roster2, roster);
    }

    #[test]
    fn edited_away_count_falls_back_to_default_capacity() {
        let body = format!("募集\n\n{DIVIDER}\n{LIST_LABEL}\n- Alice (<@1>)");
        let (_, roster) = decode(&body);
        assert_eq!(roster.capacity, DEFAULT_CAPACITY);
        assert_eq!(roster.entries.len(), 1);
    }

    #[test]
    fn zero_capacity_marker_is_clamped() {
        let body = format!("募集\n\n{DIVIDER}\n{LIST_LABEL} (0/0)");
        let (_, roster) = decode(&body);
        assert_eq!(roster.capacity, 1);
    }
}
