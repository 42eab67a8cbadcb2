use log::error;

use fruid::{Fru, detail::DetailRow};

pub fn show(fru: &Fru) {
    match serde_json::to_string_pretty(&fru.to_json()) {
        Ok(s) => println!("{s}"),
        Err(e) => error!("Cannot format FRU data: {e}"),
    }
}

pub fn details(rows: &[DetailRow]) {
    println!();
    println!("{:13}  {:32}  value", "offset", "description");
    for r in rows {
        println!("{r}");
    }
}
