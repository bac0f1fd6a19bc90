//! Built-in relationship table for the 47 prefectures of Japan.
//!
//! Codes are two-digit JIS X 0401 prefecture codes ("01" Hokkaido through
//! "47" Okinawa), matching the first two characters of a municipality code.
//! Adjacency means a shared land boundary; coastal means the prefecture
//! faces the sea.

use crate::models::{Relationship, RelationshipTable, UnitCode};

/// (code, name, coastal, land neighbours)
const PREFECTURES: &[(u8, &str, bool, &[u8])] = &[
    (1, "北海道", true, &[]),
    (2, "青森県", true, &[3, 5]),
    (3, "岩手県", true, &[2, 4, 5]),
    (4, "宮城県", true, &[3, 5, 6, 7]),
    (5, "秋田県", true, &[2, 3, 4, 6]),
    (6, "山形県", true, &[4, 5, 7, 15]),
    (7, "福島県", true, &[4, 6, 8, 9, 10, 15]),
    (8, "茨城県", true, &[7, 9, 11, 12]),
    (9, "栃木県", false, &[7, 8, 10, 11]),
    (10, "群馬県", false, &[7, 9, 11, 15, 20]),
    (11, "埼玉県", false, &[8, 9, 10, 12, 13, 19, 20]),
    (12, "千葉県", true, &[8, 11, 13]),
    (13, "東京都", true, &[11, 12, 14, 19]),
    (14, "神奈川県", true, &[13, 19, 22]),
    (15, "新潟県", true, &[6, 7, 10, 16, 20]),
    (16, "富山県", true, &[15, 17, 20, 21]),
    (17, "石川県", true, &[16, 18, 21]),
    (18, "福井県", true, &[17, 21, 25, 26]),
    (19, "山梨県", false, &[11, 13, 14, 20, 22]),
    (20, "長野県", false, &[10, 11, 15, 16, 19, 21, 22, 23]),
    (21, "岐阜県", false, &[16, 17, 18, 20, 23, 24, 25]),
    (22, "静岡県", true, &[14, 19, 20, 23]),
    (23, "愛知県", true, &[20, 21, 22, 24]),
    (24, "三重県", true, &[21, 23, 25, 26, 29, 30]),
    (25, "滋賀県", false, &[18, 21, 24, 26]),
    (26, "京都府", true, &[18, 24, 25, 27, 28, 29]),
    (27, "大阪府", true, &[26, 28, 29, 30]),
    (28, "兵庫県", true, &[26, 27, 31, 33]),
    (29, "奈良県", false, &[24, 26, 27, 30]),
    (30, "和歌山県", true, &[24, 27, 29]),
    (31, "鳥取県", true, &[28, 32, 33, 34]),
    (32, "島根県", true, &[31, 34, 35]),
    (33, "岡山県", true, &[28, 31, 34]),
    (34, "広島県", true, &[31, 32, 33, 35]),
    (35, "山口県", true, &[32, 34]),
    (36, "徳島県", true, &[37, 38, 39]),
    (37, "香川県", true, &[36, 38]),
    (38, "愛媛県", true, &[36, 37, 39]),
    (39, "高知県", true, &[36, 38]),
    (40, "福岡県", true, &[41, 43, 44]),
    (41, "佐賀県", true, &[40, 42]),
    (42, "長崎県", true, &[41]),
    (43, "熊本県", true, &[40, 44, 45, 46]),
    (44, "大分県", true, &[40, 43, 45]),
    (45, "宮崎県", true, &[43, 44, 46]),
    (46, "鹿児島県", true, &[43, 45]),
    (47, "沖縄県", true, &[]),
];

/// Two-digit prefecture code, e.g. `13` -> "13"
pub fn prefecture_code(code: u8) -> UnitCode {
    UnitCode::new(format!("{:02}", code))
}

/// Prefecture name for a JIS code
pub fn prefecture_name(code: u8) -> Option<&'static str> {
    PREFECTURES
        .iter()
        .find(|(c, ..)| *c == code)
        .map(|(_, name, ..)| *name)
}

pub fn prefectures() -> RelationshipTable {
    PREFECTURES
        .iter()
        .map(|(code, name, coastal, adjacent)| {
            (
                prefecture_code(*code),
                Relationship {
                    name: Some(name.to_string()),
                    adjacent: adjacent.iter().map(|c| prefecture_code(*c)).collect(),
                    coastal: *coastal,
                },
            )
        })
        .collect()
}
