//! 替换模板展开
//!
//! 支持的占位符：
//! - `$N` / `${N}` / `\N`（单个数字）：第 N 个捕获组，`$0` 为整个匹配
//! - `${name}`：命名捕获组
//! - `$$` -> `$`，`\\` -> `\`，`\n` -> 换行，`\t` -> 制表符
//!
//! 超出范围或未参与匹配的组展开为空串；无法识别的转义原样保留。

use crate::kernel::services::ports::search::MatchRecord;

fn group<'a>(groups: &'a [Option<String>], index: usize) -> &'a str {
    groups
        .get(index)
        .and_then(|g| g.as_deref())
        .unwrap_or_default()
}

fn named<'a>(groups: &'a [Option<String>], names: &[Option<String>], name: &str) -> &'a str {
    names
        .iter()
        .position(|n| n.as_deref() == Some(name))
        .map(|index| group(groups, index))
        .unwrap_or_default()
}

pub fn expand(template: &str, groups: &[Option<String>], names: &[Option<String>]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        match ch {
            '$' => match chars.peek().copied() {
                Some((_, '$')) => {
                    chars.next();
                    out.push('$');
                }
                Some((_, '{')) => {
                    let rest = &template[i + 2..];
                    match rest.find('}') {
                        Some(close) => {
                            let key = &rest[..close];
                            match key.parse::<usize>() {
                                Ok(n) => out.push_str(group(groups, n)),
                                Err(_) => out.push_str(named(groups, names, key)),
                            }
                            // 跳过 "{key}"
                            let consumed = key.chars().count() + 2;
                            for _ in 0..consumed {
                                chars.next();
                            }
                        }
                        None => out.push('$'),
                    }
                }
                Some((_, d)) if d.is_ascii_digit() => {
                    let mut n = 0usize;
                    while let Some(&(_, d)) = chars.peek() {
                        let Some(v) = d.to_digit(10) else { break };
                        n = n.saturating_mul(10).saturating_add(v as usize);
                        chars.next();
                    }
                    out.push_str(group(groups, n));
                }
                _ => out.push('$'),
            },
            '\\' => match chars.peek().copied() {
                Some((_, d)) if d.is_ascii_digit() => {
                    chars.next();
                    out.push_str(group(groups, d.to_digit(10).unwrap_or(0) as usize));
                }
                Some((_, '\\')) => {
                    chars.next();
                    out.push('\\');
                }
                Some((_, 'n')) => {
                    chars.next();
                    out.push('\n');
                }
                Some((_, 't')) => {
                    chars.next();
                    out.push('\t');
                }
                _ => out.push('\\'),
            },
            _ => out.push(ch),
        }
    }

    out
}

impl MatchRecord {
    pub fn expand(&self, template: &str) -> String {
        expand(template, &self.groups, &self.group_names)
    }
}
