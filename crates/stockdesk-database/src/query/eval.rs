//! In-process evaluation of filters and pipeline stages over JSON documents.
//!
//! Used directly by the in-memory backend, and by the PostgreSQL backend
//! for the stages that follow the tenant match of an aggregation.

use std::cmp::Ordering;

use serde_json::{Map, Number, Value};

use stockdesk_core::types::{FilterField, FilterOp, FilterValue, SortField};

use super::pipeline::{Accumulator, Stage};

/// Whether `doc` satisfies every condition.
pub fn matches(conditions: &[FilterField], doc: &Value) -> bool {
    conditions.iter().all(|c| condition_holds(c, doc.get(&c.field)))
}

fn condition_holds(condition: &FilterField, field: Option<&Value>) -> bool {
    let field = field.filter(|v| !v.is_null());
    match condition.op {
        FilterOp::IsNull => field.is_none(),
        FilterOp::IsNotNull => field.is_some(),
        FilterOp::Eq => field.is_some_and(|v| equals(v, &condition.value)),
        FilterOp::Ne => !field.is_some_and(|v| equals(v, &condition.value)),
        FilterOp::Gt => compare(field, &condition.value) == Some(Ordering::Greater),
        FilterOp::Gte => matches!(
            compare(field, &condition.value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        FilterOp::Lt => compare(field, &condition.value) == Some(Ordering::Less),
        FilterOp::Lte => matches!(
            compare(field, &condition.value),
            Some(Ordering::Less | Ordering::Equal)
        ),
        FilterOp::Like | FilterOp::ILike => {
            let (Some(Value::String(text)), FilterValue::String(pattern)) = (field, &condition.value)
            else {
                return false;
            };
            if condition.op == FilterOp::ILike {
                like(&pattern.to_lowercase(), &text.to_lowercase())
            } else {
                like(pattern, text)
            }
        }
        FilterOp::In => match (field, &condition.value) {
            (Some(v), FilterValue::StringList(list)) => {
                let text = scalar_text(v);
                text.is_some_and(|t| list.iter().any(|candidate| *candidate == t))
            }
            _ => false,
        },
    }
}

fn equals(value: &Value, expected: &FilterValue) -> bool {
    match (value, expected) {
        (Value::String(a), FilterValue::String(b)) => a == b,
        (Value::Bool(a), FilterValue::Boolean(b)) => a == b,
        (Value::Number(_), FilterValue::Integer(_) | FilterValue::Float(_)) => {
            compare(Some(value), expected) == Some(Ordering::Equal)
        }
        _ => false,
    }
}

fn compare(value: Option<&Value>, expected: &FilterValue) -> Option<Ordering> {
    match (value?, expected) {
        (Value::Number(n), FilterValue::Integer(i)) => n.as_f64()?.partial_cmp(&(*i as f64)),
        (Value::Number(n), FilterValue::Float(f)) => n.as_f64()?.partial_cmp(f),
        (Value::String(s), FilterValue::String(t)) => Some(s.as_str().cmp(t.as_str())),
        (Value::Bool(a), FilterValue::Boolean(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// One element of a compiled `LIKE` pattern.
#[derive(Clone, Copy, PartialEq)]
enum Token {
    Any,
    One,
    Lit(char),
}

/// SQL `LIKE` semantics: `%` matches any run, `_` matches one character,
/// and a backslash makes the next character literal.
fn like(pattern: &str, text: &str) -> bool {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => Token::Any,
            '_' => Token::One,
            '\\' => Token::Lit(chars.next().unwrap_or('\\')),
            c => Token::Lit(c),
        });
    }
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match tokens.get(p) {
            Some(Token::One) => {
                p += 1;
                t += 1;
            }
            Some(Token::Lit(c)) if *c == text[t] => {
                p += 1;
                t += 1;
            }
            Some(Token::Any) => {
                backtrack = Some((p, t));
                p += 1;
            }
            _ => match backtrack {
                Some((bp, bt)) => {
                    p = bp + 1;
                    t = bt + 1;
                    backtrack = Some((bp, bt + 1));
                }
                None => return false,
            },
        }
    }
    tokens[p..].iter().all(|token| *token == Token::Any)
}

/// Total order over JSON values used for sorting: null, bool, number, string.
pub fn order_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Sort documents in place. Falls back to `id` so the order is stable
/// across backends.
pub fn sort_documents(docs: &mut [Value], sort: &[SortField]) {
    docs.sort_by(|a, b| {
        sort.iter()
            .map(|s| s.direction.apply(order_values(a.get(&s.field), b.get(&s.field))))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| order_values(a.get("id"), b.get("id")))
    });
}

/// Apply stages in order.
pub fn run_stages(mut docs: Vec<Value>, stages: &[Stage]) -> Vec<Value> {
    for stage in stages {
        docs = match stage {
            Stage::Match(filter) => docs
                .into_iter()
                .filter(|d| matches(&filter.conditions, d))
                .collect(),
            Stage::Group { by, accumulators } => group(docs, by, accumulators),
            Stage::Sort(fields) => {
                sort_documents(&mut docs, fields);
                docs
            }
            Stage::Limit(n) => docs.into_iter().take(*n as usize).collect(),
        };
    }
    docs
}

#[derive(Default)]
struct Sum {
    int: i64,
    float: f64,
    is_float: bool,
}

impl Sum {
    fn add(&mut self, value: Option<&Value>) {
        let Some(Value::Number(n)) = value else {
            return;
        };
        match n.as_i64() {
            Some(i) if !self.is_float => self.int = self.int.saturating_add(i),
            _ => {
                if !self.is_float {
                    self.float = self.int as f64;
                    self.is_float = true;
                }
                self.float += n.as_f64().unwrap_or(0.0);
            }
        }
    }

    fn into_value(self) -> Value {
        if self.is_float {
            Number::from_f64(self.float).map_or(Value::Null, Value::Number)
        } else {
            Value::from(self.int)
        }
    }
}

fn group(docs: Vec<Value>, by: &[String], accumulators: &[Accumulator]) -> Vec<Value> {
    // (key, count, sums); Vec keeps first-seen group order.
    let mut groups: Vec<(Vec<Value>, u64, Vec<Sum>)> = Vec::new();

    for doc in &docs {
        let key: Vec<Value> = by
            .iter()
            .map(|f| doc.get(f).cloned().unwrap_or(Value::Null))
            .collect();
        let index = match groups.iter().position(|(k, _, _)| *k == key) {
            Some(i) => i,
            None => {
                let sums = accumulators.iter().map(|_| Sum::default()).collect();
                groups.push((key, 0, sums));
                groups.len() - 1
            }
        };
        let (_, count, sums) = &mut groups[index];
        *count += 1;
        for (acc, sum) in accumulators.iter().zip(sums.iter_mut()) {
            if let Accumulator::Sum { field, .. } = acc {
                sum.add(doc.get(field));
            }
        }
    }

    groups
        .into_iter()
        .map(|(key, count, sums)| {
            let mut out = Map::new();
            for (field, value) in by.iter().zip(key) {
                out.insert(field.clone(), value);
            }
            for (acc, sum) in accumulators.iter().zip(sums) {
                match acc {
                    Accumulator::Sum { output, .. } => {
                        out.insert(output.clone(), sum.into_value());
                    }
                    Accumulator::Count { output } => {
                        out.insert(output.clone(), Value::from(count));
                    }
                }
            }
            Value::Object(out)
        })
        .collect()
}
