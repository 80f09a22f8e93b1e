//! Fixture CSV directories shared by the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use ether_dash::Relation;
use tempfile::TempDir;

/// Header-only contents for every relation
pub fn empty_csv(relation: Relation) -> String {
    let header: Vec<&str> = relation.schema().column_names().collect();
    format!("{}\n", header.join(","))
}

/// A small, consistent data set covering every relation
pub fn sample_csv(relation: Relation) -> &'static str {
    match relation {
        Relation::Users => "id,type,site_admin,name\n1,User,False,alice\n2,Bot,True,dependabot\n",
        Relation::Repositories => {
            "id,name,full_name,owner_userfk,description,size,created_at,updated_at\n\
             10,go-ethereum,ethereum/go-ethereum,1,Official Go implementation,1200,2013-12-26 13:05:46,2023-05-17 08:30:00\n"
        }
        Relation::Issues => {
            "id,number,user_fk,repo_fk,state,locked,created_at,updated_at,author_association,title,comments,body\n\
             100,1,1,10,open,False,2020-01-01 10:00:00,2020-01-02 11:00:00,MEMBER,Crash on sync,1,\"stack trace\nline two\"\n"
        }
        Relation::Comments => {
            "id,user_fk,issue_fk,commit_id,created_at,author_association,body,sentiment,emotion\n\
             1000,2,100,abc123,2020-01-01 12:00:00,NONE,Thanks!,positive,joy\n"
        }
        Relation::Commits => "id,user_fk,repo_fk,created_at\nabc123,1,10,2020-01-03 09:00:00\n",
        Relation::Events => {
            "id,user_fk,event_type,commit_fk,created_at,issue_fk,repo_fk,total_count\n\
             5000,1,referenced,abc123,2020-01-03 09:30:00,100,10,1\n"
        }
        Relation::FileCommits => "id,commit_fk,user_fk,file_fk,raw,child_fk\n7,abc123,1,f1,@@ -1 +1 @@,\n",
        Relation::Files => "id,name,repo_fk,extension_type\nf1,core/blockchain.go,10,go\n",
        Relation::Reactions => {
            "id,user_fk,issue_fk,created_at,author_association,content,comment_id,total_count,plus_one,minus_one,laugh,hooray,confused,heart,rocket,eyes\n\
             9,2,100,2020-01-01 12:30:00,NONE,heart,1000,3,1,0,0,0,0,2,0,0\n"
        }
    }
}

/// Write the sample data set, with `overrides` replacing single files
pub fn write_data_dir(dir: &Path, overrides: &[(Relation, &str)]) {
    for relation in Relation::IMPORT_ORDER {
        let contents = overrides
            .iter()
            .find(|(r, _)| *r == relation)
            .map_or(sample_csv(relation), |(_, contents)| *contents);
        fs::write(dir.join(relation.file_name()), contents).expect("write fixture");
    }
}

/// Temporary directory with the sample data set
pub fn sample_dir(overrides: &[(Relation, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    write_data_dir(dir.path(), overrides);
    dir
}
