/*
 * File: /main.rs
 * Created Date: Monday, March 2nd 2026
 * Author: Zihan
 * -----
 * Last Modified: Saturday, 7th March 2026
 * Modified By: Zihan
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 */

use std::error::Error;

use clap::Parser;
use log::LevelFilter;

use fast_denseblock::config::{CliArgs, Config};

fn setup_logger(verbose: bool) -> Result<(), log::SetLoggerError> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    simple_logger::SimpleLogger::new().with_level(level).init()
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::from_cli(CliArgs::parse())?;
    setup_logger(config.is_verbose())?;

    let result = fast_denseblock::run(&config)?;
    println!("{}", result.summary());
    Ok(())
}
