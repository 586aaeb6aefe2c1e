use bimap::BiMap;
use string_cache::DefaultAtom;

use crate::address::{is_code_address, AddressType};

/**
  A symbol table maps assembly labels to the address of the instruction they label in the code
  block. It is really just a convenience wrapper around a BiMap, so that a listing can go from
  an address back to its label. Label names are interned.
*/
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
  table: BiMap<DefaultAtom, AddressType>
}

impl SymbolTable {

  pub fn new() -> SymbolTable {
    SymbolTable {
      table: BiMap::new()
    }
  }

  pub fn get_symbol(&self, address: AddressType) -> Option<&DefaultAtom> {
    self.table.get_by_right(&address)
  }

  pub fn get_address(&self, label: &str) -> Option<AddressType> {
    self.table.get_by_left(&DefaultAtom::from(label)).copied()
  }

  /**
    Records `label` at `address`. Fails, returning the pair, if the label is already defined or
    another label already names the address, or if the address is outside the code block.
  */
  pub fn insert(&mut self, label: &str, address: AddressType)
    -> Result<(), (DefaultAtom, AddressType)>
  {
    let label = DefaultAtom::from(label);
    if !is_code_address(address) {
      return Err((label, address));
    }
    self.table.insert_no_overwrite(label, address)
  }

  pub fn contains(&self, label: &str) -> bool {
    self.table.contains_left(&DefaultAtom::from(label))
  }

  pub fn len(&self) -> usize {
    self.table.len()
  }

  pub fn is_empty(&self) -> bool {
    self.table.is_empty()
  }

  /// Labels in address order.
  pub fn iter(&self) -> impl Iterator<Item = (&DefaultAtom, AddressType)> {
    let mut entries: Vec<_> = self.table.iter().map(|(label, address)| (label, *address)).collect();
    entries.sort_by_key(|(_, address)| *address);
    entries.into_iter()
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::address::RW_MIN;

  #[test]
  fn insert_and_lookup(){
    let mut table = SymbolTable::new();
    assert!(table.insert("main", 0x0000).is_ok());
    assert!(table.insert("loop", 0x000C).is_ok());
    assert_eq!(table.get_address("loop"), Some(0x000C));
    assert_eq!(table.get_symbol(0x0000).map(|a| a.to_string()), Some("main".to_string()));
    assert_eq!(table.len(), 2);
  }

  #[test]
  fn no_overwrite(){
    let mut table = SymbolTable::new();
    table.insert("main", 0x0000).unwrap();
    assert!(table.insert("main", 0x0006).is_err());
    assert_eq!(table.get_address("main"), Some(0x0000));
  }

  #[test]
  fn code_block_only(){
    let mut table = SymbolTable::new();
    assert!(table.insert("data", RW_MIN).is_err());
    assert!(table.is_empty());
  }

  #[test]
  fn iterates_in_address_order(){
    let mut table = SymbolTable::new();
    table.insert("b", 0x0012).unwrap();
    table.insert("a", 0x0006).unwrap();
    let labels: Vec<String> = table.iter().map(|(l, _)| l.to_string()).collect();
    assert_eq!(labels, vec!["a".to_string(), "b".to_string()]);
  }
}
