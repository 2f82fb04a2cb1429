pub mod combined;
pub mod config;
pub mod nonstandard;
pub mod preset;

pub mod phase0 {
    pub mod consts;
    pub mod containers;
    pub mod primitives;
}

pub mod altair {
    pub mod consts;
    pub mod containers;
    pub mod primitives;
}

pub mod bellatrix {
    pub mod containers;
    pub mod primitives;
}

pub mod capella {
    pub mod containers;
}

pub mod deneb {
    pub mod consts;
    pub mod containers;
    pub mod primitives;
}
