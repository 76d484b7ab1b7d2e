/// Command table and dispatch
///
/// Commands are matched case-insensitively against the argument at their
/// position, first match wins. Handlers return errors instead of exiting;
/// the binary turns an error into its message on stdout and a failure status.

use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::path::Path;

use crate::relay::{parse_lenient, BoardSource, RelayChannel, RelayValue};
use crate::self_test::SelfTest;
use crate::watcher::Operator;

pub const PROGRAM: &str = "quadrelay";

/// What a handler gets to work with. Only handlers that touch relays ask
/// `boards` for the lines, so help/version/warranty never need settings.
pub struct Session<'a> {
    pub boards: &'a mut dyn BoardSource,
    pub operator: &'a mut dyn Operator,
    pub out: &'a mut dyn Write,
}

pub type Handler = fn(&[String], &mut Session<'_>) -> Result<()>;

pub struct Command {
    pub name: &'static str,
    /// Index in the argument vector (program name is 0) holding the name
    pub arg_position: usize,
    pub handler: Handler,
    pub help: &'static str,
    pub usage1: &'static str,
    pub usage2: &'static str,
    pub example: &'static str,
}

const CMD_HELP: Command = Command {
    name: "-h",
    arg_position: 1,
    handler: do_help,
    help: "\t-h           Display the list of command options or one command option details\n",
    usage1: "\tUsage:       quadrelay -h    Display command options list\n",
    usage2: "\tUsage:       quadrelay -h <param>   Display help for <param> command option\n",
    example: "\tExample:     quadrelay -h write    Display help for \"write\" command option\n",
};

const CMD_VERSION: Command = Command {
    name: "-v",
    arg_position: 1,
    handler: do_version,
    help: "\t-v           Display the version number\n",
    usage1: "\tUsage:       quadrelay -v\n",
    usage2: "",
    example: "\tExample:     quadrelay -v  Display the version number\n",
};

const CMD_WARRANTY: Command = Command {
    name: "-warranty",
    arg_position: 1,
    handler: do_warranty,
    help: "\t-warranty    Display the warranty\n",
    usage1: "\tUsage:       quadrelay -warranty\n",
    usage2: "",
    example: "\tExample:     quadrelay -warranty  Display the warranty text\n",
};

const CMD_WRITE: Command = Command {
    name: "write",
    arg_position: 1,
    handler: do_write,
    help: "\twrite:       Set relays On/Off\n",
    usage1: "\tUsage:       quadrelay write <channel> <on/off>\n",
    usage2: "",
    example: "\tExample:     quadrelay write 2 1; Set Relay #2 On\n",
};

const CMD_READ: Command = Command {
    name: "read",
    arg_position: 1,
    handler: do_read,
    help: "\tread:        Read relays status\n",
    usage1: "\tUsage:       quadrelay read <channel>\n",
    usage2: "",
    example: "\tExample:     quadrelay read 2; Read Status of Relay #2\n",
};

const CMD_TEST: Command = Command {
    name: "test",
    arg_position: 1,
    handler: do_test,
    help: "\ttest:        Turn ON and OFF the relays until press a key\n",
    usage1: "\tUsage:       quadrelay test [<result-file>]\n",
    usage2: "",
    example: "\tExample:     quadrelay test /tmp/relay.txt\n",
};

/// Every command, in matching and listing order
pub static COMMANDS: &[Command] = &[CMD_VERSION, CMD_HELP, CMD_WARRANTY, CMD_WRITE, CMD_READ, CMD_TEST];

const WARRANTY: &str = "\t       Copyright (c) 2016-2021 Sequent Microsystems

\t\tThis program is free software; you can redistribute it and/or modify
\t\tit under the terms of the GNU Lesser General Public License as published
\t\tby the Free Software Foundation, either version 3 of the License, or
\t\t(at your option) any later version.

\t\tThis program is distributed in the hope that it will be useful,
\t\tbut WITHOUT ANY WARRANTY; without even the implied warranty of
\t\tMERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
\t\tGNU Lesser General Public License for more details.
\t\t\t
\t\tYou should have received a copy of the GNU Lesser General Public License
\t\talong with this program. If not, see <http://www.gnu.org/licenses/>.";

/// Select and run the command named in `args`. `args[0]` is the program name.
pub fn dispatch(args: &[String], session: &mut Session<'_>) -> Result<()> {
    if args.len() <= 1 {
        return Err(anyhow!("{}", usage_listing()));
    }

    let command = COMMANDS.iter().find(|command| {
        args.len() > command.arg_position && args[command.arg_position].eq_ignore_ascii_case(command.name)
    });

    match command {
        Some(command) => {
            log::debug!(target: "commands", "dispatching {:?} with {} args", command.name, args.len());
            (command.handler)(args, session)
        }
        None => Err(anyhow!("! Invalid command option\n{}", usage_listing())),
    }
}

pub fn find(name: &str) -> Option<&'static Command> {
    COMMANDS.iter().find(|command| command.name.eq_ignore_ascii_case(name))
}

/// Both usage lines of every command
pub fn usage_listing() -> String {
    COMMANDS
        .iter()
        .map(|command| format!("{}{}", command.usage1, command.usage2))
        .collect()
}

fn do_help(args: &[String], session: &mut Session<'_>) -> Result<()> {
    if args.len() == 3 {
        match find(&args[2]) {
            Some(command) => write!(
                session.out,
                "{}{}{}{}",
                command.help, command.usage1, command.usage2, command.example
            )?,
            None => {
                writeln!(session.out, "Option \"{}\" not found", args[2])?;
                write!(session.out, "{}", usage_listing())?;
            }
        }
    } else {
        write!(session.out, "{}", usage_listing())?;
    }
    Ok(())
}

fn do_version(_args: &[String], session: &mut Session<'_>) -> Result<()> {
    writeln!(
        session.out,
        "{} v{} Copyright (c) 2016 - 2021 Sequent Microsystems",
        PROGRAM,
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(session.out, "\nThis is free software with ABSOLUTELY NO WARRANTY.")?;
    writeln!(session.out, "For details type: {} -warranty", PROGRAM)?;
    Ok(())
}

fn do_warranty(_args: &[String], session: &mut Session<'_>) -> Result<()> {
    writeln!(session.out, "{}", WARRANTY)?;
    Ok(())
}

fn do_write(args: &[String], session: &mut Session<'_>) -> Result<()> {
    if args.len() != 4 {
        return Err(anyhow!("{}", CMD_WRITE.usage1));
    }
    let channel = RelayChannel::new(parse_lenient(&args[2]))?;
    let value = RelayValue::clamped(parse_lenient(&args[3]));

    session.boards.board()?.write(channel.pin(), value).context("! Fail to write")?;
    log::info!(target: "commands", "relay {} set to {}", channel, value.level());
    Ok(())
}

fn do_read(args: &[String], session: &mut Session<'_>) -> Result<()> {
    if args.len() != 3 {
        return Err(anyhow!("{}", CMD_READ.usage1));
    }
    let channel = RelayChannel::new(parse_lenient(&args[2]))?;

    let level = session.boards.board()?.read(channel.pin()).context("! Fail to read")?;
    writeln!(session.out, "{}", level)?;
    Ok(())
}

fn do_test(args: &[String], session: &mut Session<'_>) -> Result<()> {
    let result_path = if args.len() == 3 { Some(Path::new(&args[2])) } else { None };

    let board = session.boards.board()?;
    SelfTest::new(board).run(&mut *session.operator, result_path, &mut *session.out)?;
    Ok(())
}
