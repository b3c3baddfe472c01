use crate::cisco::command::{Command, CommandData, CommandKind, TimeRangeDef};
use crate::cisco::registry::Registration;
use crate::model::{DayWindow, Weekday};

inventory::submit! { Registration::new("time-range", CommandKind::TimeRange) }
inventory::submit! { Registration::new("periodic", CommandKind::Periodic) }
inventory::submit! { Registration::new("absolute", CommandKind::Absolute) }

const DAY_START: &str = "0:00";
const DAY_END: &str = "23:59";

pub(super) fn parse(cmd: &mut Command) {
    match cmd.kind {
        CommandKind::TimeRange => {
            cmd.declared_id = Some(cmd.word(1).to_string());
            let mut def = TimeRangeDef::default();
            for child in &cmd.children {
                match &child.data {
                    CommandData::Periodic { windows } => def.windows.extend(windows.iter().cloned()),
                    CommandData::Absolute { start, end } => {
                        def.start = start.clone();
                        def.end = end.clone();
                    }
                    _ => {}
                }
            }
            cmd.data = CommandData::TimeRange(def);
        }
        CommandKind::Periodic => match expand_periodic(cmd.words_from(1)) {
            Some(windows) => cmd.data = CommandData::Periodic { windows },
            None => {
                let message = format!("Invalid periodic time range ({})", cmd.words_from(1).join(" "));
                cmd.manual(message);
            }
        },
        CommandKind::Absolute => {
            let start = clause(cmd.words_from(1), "start");
            let end = clause(cmd.words_from(1), "end");
            cmd.data = CommandData::Absolute { start, end };
        }
        _ => {}
    }
}

// absolute [start <time> <date>] [end <time> <date>]
fn clause(words: &[String], keyword: &str) -> Option<String> {
    let pos = words.iter().position(|word| word == keyword)?;
    let value: Vec<&str> = words[pos + 1..]
        .iter()
        .map(String::as_str)
        .take_while(|word| *word != "start" && *word != "end")
        .collect();
    (!value.is_empty()).then(|| value.join(" "))
}

fn day_set(word: &str) -> Option<Vec<Weekday>> {
    match word.to_ascii_lowercase().as_str() {
        "daily" => Some(Weekday::ALL.to_vec()),
        "weekdays" => Some(Weekday::ALL[1..6].to_vec()),
        "weekend" => Some(vec![Weekday::Saturday, Weekday::Sunday]),
        _ => Weekday::parse(word).map(|day| vec![day]),
    }
}

/// Expand `<days> <hh:mm> to [<day>] <hh:mm>` into per-day windows.
///
/// A day list (`weekdays`, `Monday Wednesday`) gives one window over those
/// days. A span (`Friday 22:00 to Monday 6:00`) gives a partial first day,
/// whole middle days, and a partial last day, wrapping past Saturday.
pub fn expand_periodic(words: &[String]) -> Option<Vec<DayWindow>> {
    let to_pos = words.iter().position(|word| word == "to")?;
    let (head, tail) = (&words[..to_pos], &words[to_pos + 1..]);
    let (from, day_words) = head.split_last()?;

    let mut days = Vec::new();
    for word in day_words {
        for day in day_set(word)? {
            if !days.contains(&day) {
                days.push(day);
            }
        }
    }
    if days.is_empty() || !is_time(from) {
        return None;
    }

    match tail {
        [to] if is_time(to) => Some(vec![DayWindow {
            days,
            from: from.clone(),
            to: to.clone(),
        }]),
        [end_day, to] if is_time(to) && days.len() == 1 => {
            let end = Weekday::parse(end_day)?;
            Some(span(days[0], from, end, to))
        }
        _ => None,
    }
}

fn span(start: Weekday, from: &str, end: Weekday, to: &str) -> Vec<DayWindow> {
    if start == end {
        return vec![DayWindow {
            days: vec![start],
            from: from.to_string(),
            to: to.to_string(),
        }];
    }

    let (s, e) = (start.index(), end.index());
    let middle: Vec<Weekday> = if s < e {
        Weekday::ALL[s + 1..e].to_vec()
    } else {
        Weekday::ALL[s + 1..]
            .iter()
            .chain(&Weekday::ALL[..e])
            .copied()
            .collect()
    };

    let mut windows = vec![DayWindow {
        days: vec![start],
        from: from.to_string(),
        to: DAY_END.to_string(),
    }];
    if !middle.is_empty() {
        windows.push(DayWindow {
            days: middle,
            from: DAY_START.to_string(),
            to: DAY_END.to_string(),
        });
    }
    windows.push(DayWindow {
        days: vec![end],
        from: DAY_START.to_string(),
        to: to.to_string(),
    });
    windows
}

fn is_time(word: &str) -> bool {
    match word.split_once(':') {
        Some((hours, minutes)) => {
            hours.parse::<u8>().is_ok_and(|h| h < 24) && minutes.parse::<u8>().is_ok_and(|m| m < 60)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{expand_periodic, parse};
    use crate::cisco::command::CommandData;
    use crate::cisco::commands::test_support::command;
    use crate::model::{DayWindow, Weekday};

    fn words(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    fn window(days: &[Weekday], from: &str, to: &str) -> DayWindow {
        DayWindow {
            days: days.to_vec(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    #[test]
    fn weekdays_expand_to_one_window() {
        let windows = expand_periodic(&words("weekdays 8:00 to 18:00")).expect("valid");
        assert_eq!(
            windows,
            vec![window(
                &[
                    Weekday::Monday,
                    Weekday::Tuesday,
                    Weekday::Wednesday,
                    Weekday::Thursday,
                    Weekday::Friday
                ],
                "8:00",
                "18:00"
            )]
        );
    }

    #[test]
    fn forward_span_splits_into_three_parts() {
        let windows = expand_periodic(&words("Monday 8:00 to Wednesday 17:00")).expect("valid");
        assert_eq!(
            windows,
            vec![
                window(&[Weekday::Monday], "8:00", "23:59"),
                window(&[Weekday::Tuesday], "0:00", "23:59"),
                window(&[Weekday::Wednesday], "0:00", "17:00"),
            ]
        );
    }

    #[test]
    fn span_wraps_past_saturday() {
        let windows = expand_periodic(&words("Friday 22:00 to Monday 6:00")).expect("valid");
        assert_eq!(
            windows,
            vec![
                window(&[Weekday::Friday], "22:00", "23:59"),
                window(&[Weekday::Saturday, Weekday::Sunday], "0:00", "23:59"),
                window(&[Weekday::Monday], "0:00", "6:00"),
            ]
        );
    }

    #[test]
    fn malformed_periodic_is_manual() {
        assert_eq!(expand_periodic(&words("someday 8:00 to 9:00")), None);
        assert_eq!(expand_periodic(&words("Monday 25:00 to 9:00")), None);

        let mut cmd = command("periodic whenever");
        parse(&mut cmd);
        assert_eq!(cmd.data, CommandData::None);
        assert!(cmd.incident.is_some());
    }

    #[test]
    fn absolute_clauses() {
        let mut cmd = command("absolute start 08:00 01 March 2020 end 18:00 31 March 2020");
        parse(&mut cmd);
        assert_eq!(
            cmd.data,
            CommandData::Absolute {
                start: Some("08:00 01 March 2020".to_string()),
                end: Some("18:00 31 March 2020".to_string())
            }
        );
    }
}
