//! Administrator bootstrap
//!
//! BurnScc needs an elevated token to talk to the programmer, and UI
//! Automation cannot drive an elevated window from a non-elevated process.

use anyhow::Result;

/// Flag appended to the relaunched command line so the child does not loop.
pub const NO_ELEVATE_FLAG: &str = "--no-elevate";

/// Relaunch the current command elevated when needed.
///
/// Returns `true` when an elevated copy was started and this process should
/// exit without doing anything else.
pub fn relaunch_if_needed() -> Result<bool> {
    imp::relaunch_if_needed()
}

/// Quote one argument so `CommandLineToArgvW` / the MSVC runtime read it back
/// unchanged.
///
/// Backslashes are literal unless they precede a quote: a run of n
/// backslashes before `"` becomes 2n+1 plus the quote, and a run at the end
/// of a quoted argument is doubled so it cannot escape the closing quote.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn quote_arg(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains([' ', '\t', '\n', '\x0b', '"']) {
        return arg.to_string();
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    let mut backslashes = 0;
    for c in arg.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                quoted.extend(std::iter::repeat('\\').take(backslashes * 2 + 1));
                quoted.push('"');
                backslashes = 0;
            }
            other => {
                quoted.extend(std::iter::repeat('\\').take(backslashes));
                quoted.push(other);
                backslashes = 0;
            }
        }
    }
    quoted.extend(std::iter::repeat('\\').take(backslashes * 2));
    quoted.push('"');
    quoted
}

#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn relaunch_parameters<I: IntoIterator<Item = String>>(args: I) -> String {
    args.into_iter()
        .chain(std::iter::once(NO_ELEVATE_FLAG.to_string()))
        .map(|a| quote_arg(&a))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(target_os = "windows")]
mod imp {
    use super::relaunch_parameters;
    use anyhow::{bail, Context, Result};
    use tracing::info;
    use windows::core::{HSTRING, PCWSTR};
    use windows::Win32::UI::Shell::{IsUserAnAdmin, ShellExecuteW};
    use windows::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;

    pub fn relaunch_if_needed() -> Result<bool> {
        if unsafe { IsUserAnAdmin() }.as_bool() {
            return Ok(false);
        }

        let exe = std::env::current_exe().context("Could not determine the ctburn executable")?;
        let parameters = relaunch_parameters(std::env::args().skip(1));
        info!("Not elevated, relaunching {} as administrator", exe.display());

        let verb = HSTRING::from("runas");
        let file = HSTRING::from(exe.as_os_str());
        let parameters = HSTRING::from(parameters);
        let result = unsafe {
            ShellExecuteW(
                None,
                PCWSTR(verb.as_ptr()),
                PCWSTR(file.as_ptr()),
                PCWSTR(parameters.as_ptr()),
                PCWSTR::null(),
                SW_SHOWNORMAL,
            )
        };
        // Values above 32 mean success
        if result.0 as isize <= 32 {
            bail!(
                "Elevation was refused or failed (ShellExecuteW returned {:?})",
                result.0
            );
        }
        Ok(true)
    }
}

#[cfg(not(target_os = "windows"))]
mod imp {
    use anyhow::Result;

    pub fn relaunch_if_needed() -> Result<bool> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relaunch_keeps_arguments_and_disables_elevation() {
        let params = relaunch_parameters(vec![
            "run".to_string(),
            "--config".to_string(),
            r"C:\Burn Jobs\job.json".to_string(),
        ]);
        assert_eq!(params, r#"run --config "C:\Burn Jobs\job.json" --no-elevate"#);
    }

    #[test]
    fn empty_and_quoted_arguments_are_quoted() {
        assert_eq!(quote_arg(""), "\"\"");
        assert_eq!(quote_arg(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(quote_arg("plain"), "plain");
    }

    #[test]
    fn trailing_backslashes_do_not_escape_closing_quote() {
        assert_eq!(quote_arg(r"C:\Burn Jobs\"), r#""C:\Burn Jobs\\""#);
        assert_eq!(quote_arg(r"C:\Burn Jobs\\"), r#""C:\Burn Jobs\\\\""#);
        // unquoted arguments keep their backslashes as typed
        assert_eq!(quote_arg(r"C:\Jobs\"), r"C:\Jobs\");
    }

    #[test]
    fn backslashes_before_quotes_are_doubled() {
        assert_eq!(quote_arg(r#"a\"b"#), r#""a\\\"b""#);
        assert_eq!(quote_arg(r"a\b c"), r#""a\b c""#);
    }

    #[test]
    fn relaunch_of_directory_argument_round_trips() {
        let params = relaunch_parameters(vec![
            "run".to_string(),
            "--error-log".to_string(),
            r"D:\Burn Logs\".to_string(),
        ]);
        assert_eq!(params, r#"run --error-log "D:\Burn Logs\\" --no-elevate"#);
    }
}
