use anyhow::{Context, Result};
use env_logger::Env;
use luckydraw_core::{LotteryError, LotterySession, LotteryStatus, LotteryStore, SilentAudio};
use luckydraw_cui::{describe_event, UiLocale};
use luckydraw_data::{
    clock_seed, load_settings, load_winners, resolve_data_dir, resolve_seed, FileStore, LANG_ENV,
    LOG_ENV,
};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

type Session = LotterySession<FileStore, SilentAudio>;

#[derive(Debug, Clone, Default)]
struct CliOptions {
    cui: bool,
    seed: Option<u64>,
    data_dir: Option<PathBuf>,
    script: Option<PathBuf>,
    locale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Help,
    Exit,
    Enter,
    Start,
    Stop,
    Continue,
    Quit,
    Wait(u64),
    Status,
    Prizes,
    Winners,
    Snapshot,
    Select(String),
    Toggle(String),
    Back(u64),
    ResetWinners,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let cmd = parts.next().unwrap_or("");
    let arg = parts.next();
    let need = |what: &str| arg.map(str::to_string).ok_or(format!("{cmd} needs {what}"));
    Ok(match cmd {
        "help" | "h" | "?" => Command::Help,
        "exit" | "bye" => Command::Exit,
        "enter" | "e" => Command::Enter,
        "start" => Command::Start,
        "stop" => Command::Stop,
        "continue" | "c" => Command::Continue,
        "quit" | "q" => Command::Quit,
        "wait" | "w" => {
            let raw = need("a duration in ms")?;
            Command::Wait(raw.parse().map_err(|_| format!("bad duration {raw}"))?)
        }
        "status" | "s" => Command::Status,
        "prizes" | "p" => Command::Prizes,
        "winners" => Command::Winners,
        "snapshot" | "json" => Command::Snapshot,
        "select" => Command::Select(need("a prize id")?),
        "toggle" => Command::Toggle(need("a prize id")?),
        "back" => {
            let raw = need("a person id")?;
            Command::Back(raw.parse().map_err(|_| format!("bad person id {raw}"))?)
        }
        "reset-winners" => Command::ResetWinners,
        other => return Err(format!("unknown command {other}")),
    })
}

fn parse_cli_options(args: &[String]) -> CliOptions {
    let mut options = CliOptions {
        locale: std::env::var(LANG_ENV).ok(),
        ..CliOptions::default()
    };
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--cui" => options.cui = true,
            "--lang" | "-l" => {
                if let Some(value) = args.get(idx + 1) {
                    options.locale = Some(value.clone());
                    idx += 1;
                }
            }
            "--seed" => {
                if let Some(value) = args.get(idx + 1) {
                    options.seed = value.parse::<u64>().ok();
                    idx += 1;
                }
            }
            "--data" => {
                if let Some(value) = args.get(idx + 1) {
                    options.data_dir = Some(PathBuf::from(value));
                    idx += 1;
                }
            }
            "--script" => {
                if let Some(value) = args.get(idx + 1) {
                    options.script = Some(PathBuf::from(value));
                    idx += 1;
                }
            }
            _ => {}
        }
        idx += 1;
    }
    options.seed = resolve_seed(options.seed);
    options
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_cli_options(&args);
    if options.cui {
        if let Err(err) = luckydraw_cui::run_with_args(&args) {
            eprintln!("cui launch error: {err:#}");
            std::process::exit(1);
        }
        return;
    }
    env_logger::Builder::from_env(Env::new().filter_or(LOG_ENV, "info")).init();
    if let Err(err) = run_repl(options) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

struct Repl {
    locale: UiLocale,
    data_dir: PathBuf,
    session: Session,
}

fn run_repl(options: CliOptions) -> Result<()> {
    let locale = UiLocale::from_opt(options.locale.as_deref());
    let data_dir = resolve_data_dir(options.data_dir.clone());
    let seed = options.seed.unwrap_or_else(clock_seed);
    let config = load_settings(&data_dir).context("load settings")?;
    let store = FileStore::open(&data_dir).context("load persons and prizes")?;
    let mut repl = Repl {
        locale,
        data_dir,
        session: LotterySession::new(config, store, SilentAudio::default(), seed),
    };
    repl.session
        .mount()
        .map_err(|err| anyhow::anyhow!(err.to_string()))
        .context("mount lottery")?;
    println!("{}: {}", locale.text("locale", "语言"), locale.code());
    println!("{}: {seed}", locale.text("seed", "种子"));
    repl.print_events();

    let interactive = options.script.is_none();
    let input: Box<dyn BufRead> = match options.script.as_ref() {
        Some(path) => {
            let body =
                fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            Box::new(io::Cursor::new(body))
        }
        None => {
            print_help(locale);
            Box::new(io::stdin().lock())
        }
    };
    if interactive {
        prompt(locale, &repl.session);
    }

    for line in input.lines() {
        let line = line.context("read command")?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            if interactive {
                prompt(locale, &repl.session);
            }
            continue;
        }
        if !interactive {
            println!("> {trimmed}");
        }
        match parse_command(trimmed) {
            Ok(Command::Exit) => break,
            Ok(command) => repl.execute(command)?,
            Err(err) => println!("{}: {err}", locale.text("error", "错误")),
        }
        repl.print_events();
        if interactive {
            prompt(locale, &repl.session);
        }
    }
    repl.session.teardown();
    Ok(())
}

fn prompt(locale: UiLocale, session: &Session) {
    print!(
        "[{}{}] > ",
        locale.status(session.status()),
        if session.is_busy() { "*" } else { "" }
    );
    let _ = io::stdout().flush();
}

impl Repl {
    fn execute(&mut self, command: Command) -> Result<()> {
        let locale = self.locale;
        match command {
            Command::Help => print_help(locale),
            Command::Exit => {}
            Command::Enter => {
                let result = self.session.enter();
                self.report(result);
            }
            Command::Start => {
                let result = self.session.start();
                self.report(result);
            }
            Command::Stop => {
                let result = self.session.stop();
                self.report(result);
            }
            Command::Continue => {
                let result = self.session.continue_round();
                self.report(result);
            }
            Command::Quit => {
                let result = self.session.quit();
                self.report(result);
            }
            Command::Wait(ms) => self.session.advance(ms),
            Command::Status => self.print_status(),
            Command::Prizes => self.print_prizes(),
            Command::Winners => self.print_winners()?,
            Command::Snapshot => {
                let body = serde_json::to_string_pretty(&self.session.snapshot())
                    .context("serialize snapshot")?;
                println!("{body}");
            }
            Command::Select(id) => {
                if self.admin_allowed() {
                    let result = self.session.store_mut().select_prize(&id);
                    self.report_store(result.map(|_| {
                        format!("{} {id}", locale.text("current prize:", "当前奖项:"))
                    }));
                }
            }
            Command::Toggle(id) => {
                if self.admin_allowed() {
                    let result = self.session.store_mut().toggle_prize(&id);
                    self.report_store(result.map(|used| format!("{id} is_used={used}")));
                }
            }
            Command::Back(person) => {
                if self.admin_allowed() {
                    let result = self.session.store_mut().move_to_pool(person);
                    self.report_store(result.map(|_| {
                        format!("{} {person}", locale.text("returned to pool:", "已放回奖池:"))
                    }));
                }
            }
            Command::ResetWinners => {
                if self.admin_allowed() {
                    let result = self.session.store_mut().reset_winners();
                    self.report_store(
                        result.map(|_| locale.text("winners cleared", "中奖记录已清空").to_string()),
                    );
                }
            }
        }
        Ok(())
    }

    fn admin_allowed(&self) -> bool {
        let idle = matches!(
            self.session.status(),
            LotteryStatus::Init | LotteryStatus::Ready
        ) && !self.session.is_busy();
        if !idle {
            println!(
                "{}",
                self.locale
                    .text("finish the current round first", "请先完成本轮抽奖")
            );
        }
        idle
    }

    fn report(&self, result: Result<(), LotteryError>) {
        match result {
            Ok(()) => {}
            Err(err) if err.is_ignored() => {
                println!("{}: {err}", self.locale.text("ignored", "已忽略"));
            }
            // Validation failures already arrive as warning events.
            Err(LotteryError::Validation(_)) => {}
            Err(err) => println!("{}: {err}", self.locale.text("error", "错误")),
        }
    }

    fn report_store<E: std::fmt::Display>(&self, result: Result<String, E>) {
        match result {
            Ok(message) => println!("{message}"),
            Err(err) => println!("{}: {err}", self.locale.text("error", "错误")),
        }
    }

    fn print_events(&mut self) {
        for event in self.session.drain_events() {
            println!("  * {}", describe_event(self.locale, &event));
        }
    }

    fn print_status(&self) {
        let locale = self.locale;
        let session = &self.session;
        println!(
            "{} {} | {} {} | t={}ms",
            locale.text("status", "状态"),
            locale.status(session.status()),
            locale.text("busy", "动画中"),
            session.is_busy(),
            session.now()
        );
        match session.store().current_prize() {
            Some(prize) => println!(
                "{} {} {} ({}/{}, {} {})",
                locale.text("prize", "奖项"),
                prize.id,
                prize.name,
                prize.is_used_count,
                prize.count,
                locale.text("next round", "下轮"),
                prize.leftover()
            ),
            None => println!("{}", locale.text("no prize selected", "未选择奖项")),
        }
        println!(
            "{} {} | {} {}",
            locale.text("pool", "奖池"),
            session.store().remaining_pool().len(),
            locale.text("winners", "中奖人数"),
            session.store().winners().count()
        );
        if let Some(round) = session.round() {
            println!(
                "{} {}:",
                locale.text("this round", "本轮"),
                round.prize.name
            );
            for winner in &round.winners {
                println!("  {} {} {}", winner.uid, winner.name, winner.department);
            }
        }
    }

    fn print_prizes(&self) {
        let store = self.session.store();
        let current = store.current_prize_id.as_deref();
        let mut prizes: Vec<_> = store.prizes.iter().collect();
        prizes.sort_by_key(|prize| prize.sort);
        for prize in prizes {
            println!(
                "{} {:<6} {:<16} {:>3}/{:<3} {}",
                if current == Some(prize.id.as_str()) { ">" } else { " " },
                prize.id,
                prize.name,
                prize.is_used_count,
                prize.count,
                if prize.is_used {
                    self.locale.text("done", "已抽完")
                } else {
                    ""
                }
            );
        }
    }

    fn print_winners(&self) -> Result<()> {
        let winners = load_winners(&self.data_dir).context("load winners")?;
        if winners.is_empty() {
            println!("{}", self.locale.text("no winners yet", "暂无中奖记录"));
        }
        for entry in winners {
            println!(
                "{} {} {} {} {}",
                entry.prize_name,
                entry.uid,
                entry.name,
                entry.department,
                entry
                    .prize_time
                    .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default()
            );
        }
        Ok(())
    }
}

fn print_help(locale: UiLocale) {
    println!("{}", locale.text("Commands:", "命令："));
    println!(
        "  enter|e                  {}",
        locale.text("arm the lottery (sphere formation)", "进入抽奖（球形阵列）")
    );
    println!(
        "  start                    {}",
        locale.text("draw winners for the current prize", "为当前奖项开始抽奖")
    );
    println!(
        "  stop                     {}",
        locale.text("reveal the drawn winners", "停止并揭晓中奖者")
    );
    println!(
        "  continue|c               {}",
        locale.text("record the round and re-arm", "记录本轮并继续")
    );
    println!(
        "  quit|q                   {}",
        locale.text("discard the round and return to idle", "放弃本轮并返回待机")
    );
    println!(
        "  wait|w <ms>              {}",
        locale.text("advance the clock", "推进时钟")
    );
    println!(
        "  status|s | prizes|p | winners | snapshot  {}",
        locale.text("inspect", "查看")
    );
    println!(
        "  select <id> | toggle <id> | back <person> | reset-winners  {}",
        locale.text("administer prizes and winners", "管理奖项与中奖记录")
    );
    println!("  exit                     {}", locale.text("leave", "退出"));
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! command_case {
        ($name:ident, $line:expr, $expected:expr) => {
            #[test]
            fn $name() {
                assert_eq!(parse_command($line), Ok($expected));
            }
        };
    }

    command_case!(parses_enter, "enter", Command::Enter);
    command_case!(parses_short_continue, "c", Command::Continue);
    command_case!(parses_wait, "wait 1200", Command::Wait(1200));
    command_case!(parses_select, "select 003", Command::Select("003".to_string()));
    command_case!(parses_back, "back 42", Command::Back(42));
    command_case!(parses_reset, "reset-winners", Command::ResetWinners);

    #[test]
    fn rejects_bad_arguments() {
        assert!(parse_command("wait soon").is_err());
        assert!(parse_command("select").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[test]
    fn flags_are_collected() {
        let args: Vec<String> = ["--seed", "9", "--script", "draw.txt", "--data", "d"]
            .iter()
            .map(|arg| arg.to_string())
            .collect();
        let options = parse_cli_options(&args);
        assert_eq!(options.seed, Some(9));
        assert_eq!(options.script, Some(PathBuf::from("draw.txt")));
        assert_eq!(options.data_dir, Some(PathBuf::from("d")));
        assert!(!options.cui);
    }
}
