use super::*;

#[test]
fn lock_path_lives_alongside_the_database() {
    let db = PathBuf::from("/var/lib/mqic/store");
    assert_eq!(lock_path_for(&db), PathBuf::from("/var/lib/mqic/store/mqic.lock"));
}
