//! Block enumeration and name lookup.

/// Internal macro to easily define the block registry.
macro_rules! blocks {
    (
        $($ident:ident / $id:literal : $name:literal),* $(,)?
    ) => {

        static NAMES: [&'static str; 256] = {
            let mut arr = [""; 256];
            $(arr[$id as usize] = $name;)*
            arr
        };

        $(pub const $ident: u8 = $id;)*

    };
}

// Block ids are persisted in chunk records, so new blocks must only ever be
// appended to this table.
blocks! {
    AIR/0:          "air",
    STONE/1:        "stone",
    DIRT/2:         "dirt",
    GRASS/3:        "grass",
    SAND/4:         "sand",
    WATER/5:        "water",
    SNOW/6:         "snow",
    COAL_ORE/7:     "coal_ore",
    IRON_ORE/8:     "iron_ore",
    GOLD_ORE/9:     "gold_ore",
    DIAMOND_ORE/10: "diamond_ore",
    LOG/11:         "log",
    LEAVES/12:      "leaves",
}

/// Get the name of a block from its id, "unknown" for unregistered ids.
pub fn name(id: u8) -> &'static str {
    let name = NAMES[id as usize];
    if name.is_empty() { "unknown" } else { name }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn names() {
        assert_eq!(name(AIR), "air");
        assert_eq!(name(DIAMOND_ORE), "diamond_ore");
        assert_eq!(name(200), "unknown");
    }

}
