pub struct AddBootcampParams<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub capability_ids: &'a [i64],
}
