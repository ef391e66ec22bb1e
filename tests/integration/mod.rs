//! Integration tests over the full rig definition
