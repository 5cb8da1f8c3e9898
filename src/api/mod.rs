// Serialized forms exchanged with capture producers.

pub mod dto;
